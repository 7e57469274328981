//! Phone number formatting
//!
//! Numbers travel to the provider in E.164 (`+81312345678`) and are shown to
//! the user in national format (`0312345678`).

/// Country calling code used when none is configured
pub const DEFAULT_COUNTRY_CODE: &str = "81";

/// Convert an international number for display.
///
/// `+<cc>XXXX` becomes `0XXXX`; anything else is returned unchanged, so
/// formatting an already-national number is a no-op.
pub fn format_for_display(number: &str, country_code: &str) -> String {
    let prefix = format!("+{}", country_code);
    match number.strip_prefix(prefix.as_str()) {
        Some(rest) if !country_code.is_empty() => format!("0{}", rest),
        _ => number.to_string(),
    }
}

/// Format a dialed number to E.164.
///
/// Separators are dropped, a national number with a leading `0` gets the
/// country code, numbers that already start with `+` are kept.
pub fn format_e164(number: &str, country_code: &str) -> String {
    let cleaned: String = number
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '+' | '*' | '#'))
        .collect();

    if cleaned.starts_with('+') {
        return cleaned;
    }

    match cleaned.strip_prefix('0') {
        Some(rest) if !rest.is_empty() => format!("+{}{}", country_code, rest),
        _ => cleaned,
    }
}

/// True if the value looks like a PSTN number (optional `+`, then digits)
pub fn is_phone_number(value: &str) -> bool {
    let digits = value.trim().strip_prefix('+').unwrap_or(value.trim());
    let digits: String = digits
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_strips_country_code() {
        assert_eq!(format_for_display("+819012345678", "81"), "09012345678");
        assert_eq!(format_for_display("+15551234567", "81"), "+15551234567");
    }

    #[test]
    fn test_display_is_idempotent() {
        for n in ["+819012345678", "0312345678", "client:softphone-user", "", "+1555"] {
            let once = format_for_display(n, "81");
            assert_eq!(format_for_display(&once, "81"), once);
        }
    }

    #[test]
    fn test_display_with_empty_country_code_is_noop() {
        assert_eq!(format_for_display("+819012345678", ""), "+819012345678");
    }

    #[test]
    fn test_e164_mobile_and_landline() {
        assert_eq!(format_e164("090-1234-5678", "81"), "+819012345678");
        assert_eq!(format_e164("03 1234 5678", "81"), "+81312345678");
    }

    #[test]
    fn test_e164_keeps_international() {
        assert_eq!(format_e164(" +1 (555) 123-4567 ", "81"), "+15551234567");
    }

    #[test]
    fn test_e164_leaves_short_codes() {
        assert_eq!(format_e164("110", "81"), "110");
        assert_eq!(format_e164("0", "81"), "0");
    }

    #[test]
    fn test_is_phone_number() {
        assert!(is_phone_number("+819012345678"));
        assert!(is_phone_number("03-1234-5678"));
        assert!(!is_phone_number("client:softphone-user"));
        assert!(!is_phone_number("+"));
        assert!(!is_phone_number("anonymous"));
    }
}
