//! Fitting generated answers into a platform character budget.
//!
//! All lengths are counted in `char`s, not bytes.

/// Default reply budget for Twitter.
pub const DEFAULT_MAX_REPLY_LENGTH: usize = 250;
/// Replies shorter than this get the call-to-action appended.
pub const DEFAULT_CTA_BUDGET: usize = 200;
/// Length of the response preview stored in analytics records.
pub const PREVIEW_LENGTH: usize = 100;

const ELLIPSIS: &str = "...";

/// Truncate `text` to at most `max_length` characters.
///
/// Prefers cutting right after the last sentence terminator (`.`, `!`, `?`)
/// when it lies beyond 70% of `max_length`; otherwise cuts hard and appends
/// `...`, which keeps the result exactly `max_length` long.
#[must_use]
pub fn truncate(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }

    let window: String = text.chars().take(max_length.saturating_sub(3)).collect();
    let end_point = window
        .chars()
        .enumerate()
        .filter(|(_, c)| matches!(c, '.' | '!' | '?'))
        .map(|(i, _)| i)
        .last();

    match end_point {
        // end > 0.7 * max_length, kept in integers
        Some(end) if end * 10 > max_length * 7 => text.chars().take(end + 1).collect(),
        _ => format!("{window}{ELLIPSIS}"),
    }
}

/// Append `" " + cta` when `text` is shorter than `budget` characters.
///
/// The call-to-action is not counted against the truncation limit, so a reply
/// can end up longer than the `max_length` passed to [`truncate`]. An empty
/// `cta` leaves the text unchanged.
#[must_use]
pub fn append_call_to_action(text: &str, cta: &str, budget: usize) -> String {
    if cta.is_empty() || text.chars().count() >= budget {
        return text.to_string();
    }
    format!("{text} {cta}")
}

/// Shorten `text` to `limit` characters, marking the cut with `...`.
#[must_use]
pub fn preview(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let head: String = text.chars().take(limit).collect();
    format!("{head}{ELLIPSIS}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filler_with_terminator_at(len: usize, at: Option<usize>, terminator: char) -> String {
        (0..len)
            .map(|i| if Some(i) == at { terminator } else { 'a' })
            .collect()
    }

    #[test]
    fn test_short_text_unchanged() {
        assert_eq!(truncate("short", 250), "short");
        let exact = "b".repeat(250);
        assert_eq!(truncate(&exact, 250), exact);
    }

    #[test]
    fn test_cuts_at_late_sentence_boundary() {
        let text = filler_with_terminator_at(300, Some(200), '.');
        let result = truncate(&text, 250);
        assert_eq!(result.chars().count(), 201);
        assert!(result.ends_with('.'));
        assert_eq!(result, &text[..201]);
    }

    #[test]
    fn test_exclamation_and_question_marks_count() {
        let text = filler_with_terminator_at(300, Some(220), '!');
        assert!(truncate(&text, 250).ends_with('!'));

        let text = filler_with_terminator_at(300, Some(190), '?');
        assert_eq!(truncate(&text, 250).chars().count(), 191);
    }

    #[test]
    fn test_early_boundary_falls_back_to_ellipsis() {
        let text = filler_with_terminator_at(300, Some(100), '.');
        let result = truncate(&text, 250);
        assert_eq!(result, format!("{}...", &text[..247]));
        assert_eq!(result.chars().count(), 250);
    }

    #[test]
    fn test_boundary_at_exactly_seventy_percent_is_not_used() {
        let text = filler_with_terminator_at(300, Some(175), '.');
        let result = truncate(&text, 250);
        assert!(result.ends_with("..."));
        assert_eq!(result.chars().count(), 250);

        let text = filler_with_terminator_at(300, Some(176), '.');
        assert_eq!(truncate(&text, 250).chars().count(), 177);
    }

    #[test]
    fn test_terminator_outside_window_is_ignored() {
        // Index 248 is past the 247-char window.
        let text = filler_with_terminator_at(300, Some(248), '.');
        assert!(truncate(&text, 250).ends_with("..."));
    }

    #[test]
    fn test_no_terminator_at_all() {
        let text = "X".repeat(300);
        let result = truncate(&text, 250);
        assert_eq!(result, format!("{}...", "X".repeat(247)));
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        let text = "é".repeat(300);
        let result = truncate(&text, 250);
        assert_eq!(result.chars().count(), 250);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_tiny_limits_do_not_panic() {
        assert_eq!(truncate("abcdef", 2), "...");
        assert_eq!(truncate("abcdef", 0), "...");
    }

    #[test]
    fn test_cta_appended_when_under_budget() {
        assert_eq!(
            append_call_to_action("Short answer.", "Learn more at taofu.xyz", 200),
            "Short answer. Learn more at taofu.xyz"
        );
    }

    #[test]
    fn test_cta_skipped_at_or_over_budget() {
        let at_budget = "c".repeat(200);
        assert_eq!(append_call_to_action(&at_budget, "cta", 200), at_budget);
        assert_eq!(append_call_to_action("text", "", 200), "text");
    }

    #[test]
    fn test_cta_can_push_reply_past_max_length() {
        // Known quirk: truncation runs first and does not reserve room for the CTA.
        let answer = filler_with_terminator_at(300, Some(198), '.');
        let truncated = truncate(&answer, 250);
        assert_eq!(truncated.chars().count(), 199);

        let cta = "x".repeat(60);
        let reply = append_call_to_action(&truncated, &cta, 200);
        assert_eq!(reply.chars().count(), 260);
        assert!(reply.chars().count() > 250);
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 100), "short");
        let long = "p".repeat(150);
        let result = preview(&long, 100);
        assert_eq!(result.chars().count(), 103);
        assert!(result.ends_with("..."));
    }
}
