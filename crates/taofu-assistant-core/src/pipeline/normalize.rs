use lazy_regex::lazy_regex;
use regex::Regex;

static RE_GREETING: lazy_regex::Lazy<Regex> = lazy_regex!(r"(?i)^(?:hey|hi|hello|yo)\s+");

/// Extract the question from raw mention text.
///
/// Removes every `@bot_handle` token (case-insensitive), strips one leading
/// greeting (`hey`, `hi`, `hello`, `yo`) and collapses whitespace.
///
/// # Examples
///
/// ```
/// use taofu_assistant_core::pipeline::normalize;
///
/// assert_eq!(normalize("@TaofuBot  hey   what is this", "taofubot"), "what is this");
/// ```
#[must_use]
pub fn normalize(raw_text: &str, bot_handle: &str) -> String {
    let without_mentions = strip_mentions(raw_text, bot_handle);
    let remaining = without_mentions.trim_start();
    let without_greeting = RE_GREETING.replace(remaining, "");

    without_greeting.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_mentions(text: &str, bot_handle: &str) -> String {
    let handle = bot_handle.trim().trim_start_matches('@');
    if handle.is_empty() {
        return text.to_string();
    }

    // `\b` keeps `@bot` from eating the prefix of `@botany`.
    match Regex::new(&format!(r"(?i)@{}\b", regex::escape(handle))) {
        Ok(re) => re.replace_all(text, "").into_owned(),
        Err(_) => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_mention_and_greeting() {
        assert_eq!(normalize("@bot hey what is this", "bot"), "what is this");
        assert_eq!(normalize("Hello @BOT how do I stake?", "bot"), "how do I stake?");
    }

    #[test]
    fn test_removes_all_mentions_case_insensitive() {
        assert_eq!(
            normalize("@Bot what is @bot doing @BOT", "bot"),
            "what is doing"
        );
    }

    #[test]
    fn test_handle_with_leading_at_sign() {
        assert_eq!(normalize("@taofu tell me more", "@taofu"), "tell me more");
    }

    #[test]
    fn test_does_not_strip_longer_handles() {
        assert_eq!(normalize("@botany what is this", "bot"), "@botany what is this");
    }

    #[test]
    fn test_other_mentions_are_kept() {
        assert_eq!(normalize("@bot @alice what is it", "bot"), "@alice what is it");
    }

    #[test]
    fn test_greeting_stripped_at_most_once() {
        assert_eq!(normalize("hey hi there", "bot"), "hi there");
    }

    #[test]
    fn test_greeting_needs_trailing_whitespace() {
        assert_eq!(normalize("history of taofu", "bot"), "history of taofu");
        assert_eq!(normalize("hey", "bot"), "hey");
        assert_eq!(normalize("yo, what", "bot"), "yo, what");
    }

    #[test]
    fn test_greeting_only_at_start() {
        assert_eq!(normalize("so hey what", "bot"), "so hey what");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize("  what\n\tis   \r\n this  ", "bot"), "what is this");
    }

    #[test]
    fn test_empty_handle_removes_nothing() {
        assert_eq!(normalize("@bot what", ""), "@bot what");
    }

    #[test]
    fn test_mention_only_becomes_empty() {
        assert_eq!(normalize("@bot", "bot"), "");
        assert_eq!(normalize("", "bot"), "");
    }

    #[test]
    fn test_handle_with_regex_metacharacters() {
        assert_eq!(normalize("@a.b what", "a.b"), "what");
        assert_eq!(normalize("@axb what", "a.b"), "@axb what");
    }
}
