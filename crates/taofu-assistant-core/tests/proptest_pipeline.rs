use proptest::prelude::*;
use taofu_assistant_core::pipeline::{normalize, preview, truncate};

const GREETINGS: [&str; 4] = ["hey", "hi", "hello", "yo"];

fn word() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-zA-Z?.!]{1,8}".prop_filter("greeting words are only generated up front", |w| {
            !GREETINGS.contains(&w.to_lowercase().as_str())
        }),
        1 => Just("@bot".to_string()),
        1 => Just("@BOT".to_string()),
    ]
}

fn mention_text() -> impl Strategy<Value = String> {
    (
        proptest::option::of(prop::sample::select(GREETINGS.to_vec())),
        prop::collection::vec((word(), "[ \t\n]{1,3}"), 0..12),
    )
        .prop_map(|(greeting, words)| {
            let mut text = greeting.map(|g| format!("{g} ")).unwrap_or_default();
            for (w, sep) in words {
                text.push_str(&w);
                text.push_str(&sep);
            }
            text
        })
}

proptest! {
    /// Normalizing twice gives the same result as normalizing once.
    #[test]
    fn normalize_is_idempotent(text in mention_text()) {
        let once = normalize(&text, "bot");
        prop_assert_eq!(normalize(&once, "bot"), once);
    }

    /// No bot mention survives normalization.
    #[test]
    fn normalize_removes_every_mention(text in mention_text()) {
        let normalized = normalize(&text, "bot").to_lowercase();
        prop_assert!(!normalized.split(' ').any(|w| w == "@bot"));
    }

    /// Truncation never exceeds the budget once it can fit the ellipsis.
    #[test]
    fn truncate_respects_max_length(text in "\\PC{0,600}", max_length in 3usize..400) {
        let result = truncate(&text, max_length);
        prop_assert!(result.chars().count() <= max_length);
    }

    /// Text already within budget is returned untouched.
    #[test]
    fn truncate_keeps_short_text(text in "\\PC{0,50}") {
        prop_assert_eq!(truncate(&text, 50), text);
    }

    /// Previews are at most the limit plus the ellipsis.
    #[test]
    fn preview_is_bounded(text in "\\PC{0,300}", limit in 0usize..150) {
        prop_assert!(preview(&text, limit).chars().count() <= limit + 3);
    }
}
