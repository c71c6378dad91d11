/// Keywords that mark text as a question.
///
/// Matched as plain substrings, so `"disable"` counts because it contains `"is"`.
const QUESTION_KEYWORDS: [&str; 18] = [
    "what", "how", "when", "where", "why", "who", "which", "can", "could", "would", "should",
    "is", "are", "do", "does", "tell", "explain", "help",
];

/// Returns `true` if the text looks like a question worth answering.
///
/// Permissive: a literal `?` or any keyword appearing
/// anywhere in the lower-cased text is enough.
#[must_use]
pub fn is_question(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains('?') || QUESTION_KEYWORDS.iter().any(|word| lower.contains(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_questions() {
        assert!(is_question("What is Taofu?"));
        assert!(is_question("HOW DO I JOIN"));
        assert!(is_question("taofu?"));
    }

    #[test]
    fn test_statements_without_keywords() {
        assert!(!is_question("nice day"));
        assert!(!is_question("gm fam"));
        assert!(!is_question(""));
    }

    #[test]
    fn test_substring_matches_are_questions() {
        // "is" inside a statement and inside another word both count.
        assert!(is_question("this is great"));
        assert!(is_question("disable"));
        assert!(is_question("shower thoughts"));
    }
}
