//! Property-based tests for normalisation helpers and status parsing.

use aerodesk_core::{slugify, TicketStatus};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Slugs only ever contain lower-case ASCII alphanumerics and inner dashes.
    #[test]
    fn slug_charset(s in "\\PC{0,200}") {
        let slug = slugify(&s);
        prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        prop_assert!(!slug.starts_with('-') && !slug.ends_with('-'));
        prop_assert!(!slug.contains("--"), "double dash in {:?}", slug);
    }

    /// slugify(slugify(x)) == slugify(x)
    #[test]
    fn slug_idempotent(s in "\\PC{0,200}") {
        let once = slugify(&s);
        prop_assert_eq!(slugify(&once), once);
    }

    /// Parsing ignores case and surrounding whitespace.
    #[test]
    fn ticket_status_case_insensitive(
        idx in 0usize..3,
        upper in proptest::collection::vec(any::<bool>(), 9),
        pad in "[ \t]{0,3}",
    ) {
        let base = ["available", "booked", "cancelled"][idx];
        let mixed: String = base
            .chars()
            .zip(upper.iter().cycle())
            .map(|(c, up)| if *up { c.to_ascii_uppercase() } else { c })
            .collect();
        let parsed: TicketStatus = format!("{pad}{mixed}{pad}").parse().unwrap();
        prop_assert_eq!(parsed.as_str(), base);
    }
}
