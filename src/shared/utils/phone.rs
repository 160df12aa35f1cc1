//! Phone number comparison used for directory lookups.
//!
//! Matching is digit-only: no country-code canonicalization and no extension
//! handling, so `"+1-555-123-4567 ext 123"` does not match `"15551234567"`.

/// Strips every character that is not an ASCII decimal digit.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|ch| ch.is_ascii_digit()).collect()
}

/// True when the two numbers are equal verbatim or have the same digit string.
pub fn phones_match(a: &str, b: &str) -> bool {
    a == b || normalize_phone(a) == normalize_phone(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_keeps_digit_order() {
        assert_eq!(normalize_phone("+1 (555) 123-4567"), "15551234567");
        assert_eq!(normalize_phone("abc"), "");
    }

    #[test]
    fn formatted_and_bare_numbers_match() {
        assert!(phones_match("+1-555-123-4567", "15551234567"));
        assert!(phones_match("555.123.4567", "(555) 123 4567"));
    }

    #[test]
    fn trailing_extension_breaks_match() {
        let base = "+1-555-123-4567";
        let with_ext = format!("{base} ext 123");
        assert!(!phones_match(base, &with_ext));
    }

    #[test]
    fn verbatim_equality_matches_without_digits() {
        assert!(phones_match("unknown", "unknown"));
        // Both normalize to "" and therefore compare equal as well.
        assert!(phones_match("n/a", "none"));
    }
}
