//! Filesystem-safe name sanitization.
//!
//! Every name that ends up as a path component goes through
//! [`sanitize`] first, so the output tree is portable across common
//! filesystems regardless of what a mail client put in a subject or
//! attachment filename.

use unicode_normalization::UnicodeNormalization;

/// Fallback name used when sanitization leaves nothing usable.
pub const FALLBACK_NAME: &str = "attachment.bin";

/// Characters that are reserved on at least one common filesystem.
const RESERVED: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Normalizes `name` into a safe single path component.
///
/// The input is NFKC-normalized, NUL/CR/LF are stripped outright, every
/// remaining control or reserved character becomes `_`, and the edges
/// are trimmed (whitespace, trailing dots, leading/trailing `_`) until
/// stable. Returns [`FALLBACK_NAME`] when the input is empty or nothing
/// survives trimming.
///
/// Total and idempotent: `sanitize(sanitize(x)) == sanitize(x)`.
#[must_use]
pub fn sanitize(name: &str) -> String {
    if name.is_empty() {
        return FALLBACK_NAME.to_string();
    }

    let replaced: String = name
        .nfkc()
        .filter(|c| !matches!(c, '\0' | '\r' | '\n'))
        .map(|c| {
            if (c as u32) < 0x20 || RESERVED.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = trim_edges(&replaced);
    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Sanitizes `name` and joins internal whitespace runs with `_`.
///
/// This is the folder-name form used for project codes and query
/// directories, where embedded spaces are unwanted.
#[must_use]
pub fn sanitize_joined(name: &str) -> String {
    sanitize(name).split_whitespace().collect::<Vec<_>>().join("_")
}

/// Trims whitespace, trailing dots, and edge underscores to a fixpoint.
fn trim_edges(name: &str) -> &str {
    let mut current = name;
    loop {
        let next = current
            .trim()
            .trim_end_matches('.')
            .trim_matches('_')
            .trim();
        if next == current {
            return next;
        }
        current = next;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plain_name_unchanged() {
        assert_eq!(sanitize("report.pdf"), "report.pdf");
        assert_eq!(sanitize("Invoice 2024"), "Invoice 2024");
    }

    #[test]
    fn test_reserved_characters_replaced() {
        assert_eq!(sanitize("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize("what?.pdf"), "what_.pdf");
        assert_eq!(sanitize("<angle>"), "angle");
    }

    #[test]
    fn test_control_characters() {
        // NUL/CR/LF vanish, other controls become the placeholder.
        assert_eq!(sanitize("a\0b\nc\rd"), "abcd");
        assert_eq!(sanitize("a\tb"), "a_b");
    }

    #[test]
    fn test_edge_trimming() {
        assert_eq!(sanitize("  padded  "), "padded");
        assert_eq!(sanitize("name..."), "name");
        assert_eq!(sanitize("__wrapped__"), "wrapped");
        // Trimming runs to a fixpoint across layers.
        assert_eq!(sanitize(" _name_. "), "name");
    }

    #[test]
    fn test_empty_and_all_reserved_fall_back() {
        assert_eq!(sanitize(""), FALLBACK_NAME);
        assert_eq!(sanitize("   "), FALLBACK_NAME);
        assert_eq!(sanitize("***"), FALLBACK_NAME);
        assert_eq!(sanitize("..."), FALLBACK_NAME);
        assert_eq!(sanitize("\0\r\n"), FALLBACK_NAME);
    }

    #[test]
    fn test_joined_form_collapses_whitespace() {
        assert_eq!(sanitize_joined("acme  corp report"), "acme_corp_report");
        assert_eq!(sanitize_joined("from:billing  2024"), "from_billing_2024");
    }

    #[test]
    fn test_unicode_composition() {
        // Fullwidth colon compatibility-normalizes to ':' and is then
        // treated as reserved.
        assert_eq!(sanitize("a\u{ff1a}b"), "a_b");
    }

    proptest! {
        #[test]
        fn prop_output_has_no_reserved_characters(input in ".*") {
            let out = sanitize(&input);
            prop_assert!(!out.chars().any(|c| RESERVED.contains(&c) || (c as u32) < 0x20));
        }

        #[test]
        fn prop_output_never_empty(input in ".*") {
            prop_assert!(!sanitize(&input).is_empty());
        }

        #[test]
        fn prop_idempotent(input in ".*") {
            let once = sanitize(&input);
            prop_assert_eq!(sanitize(&once), once);
        }
    }
}
