//! Iranian mobile number normalization and validation.
//!
//! Phone numbers arrive from web forms in every shape users type them:
//! Persian or Arabic numerals, `+98` / `0098` / `98` country prefixes, or
//! bare 10-digit numbers starting with `9`. Every layer that stores or
//! compares a phone number must pass it through [`normalize_mobile`] first
//! so that lookups and uniqueness constraints see one canonical form:
//! an 11-digit string starting with `09`.

/// Length of a canonical mobile number (`09xxxxxxxxx`).
pub const MOBILE_LEN: usize = 11;

/// Prefix every canonical mobile number starts with.
pub const MOBILE_PREFIX: &str = "09";

/// Fold Persian (`۰`-`۹`) and Arabic (`٠`-`٩`) numerals to ASCII digits,
/// dropping every non-digit character (spaces, dashes, parentheses, `+`).
fn fold_digits(input: &str) -> String {
    input
        .chars()
        .filter_map(|c| match c {
            '0'..='9' => Some(c),
            // Persian numerals U+06F0..U+06F9
            '\u{06F0}'..='\u{06F9}' => {
                char::from_digit(c as u32 - 0x06F0, 10)
            }
            // Arabic-Indic numerals U+0660..U+0669
            '\u{0660}'..='\u{0669}' => {
                char::from_digit(c as u32 - 0x0660, 10)
            }
            _ => None,
        })
        .collect()
}

/// Normalize a raw phone input to the canonical `09xxxxxxxxx` form.
///
/// Country-code prefixes `0098` and `98` are rewritten to a leading `0`,
/// and a bare 10-digit number starting with `9` is padded with `0`.
/// Invalid or short input comes back shorter than [`MOBILE_LEN`] and must
/// be rejected by [`validate_mobile`] downstream; normalization itself
/// never errors.
pub fn normalize_mobile(input: &str) -> String {
    let digits = fold_digits(input);

    if let Some(rest) = digits.strip_prefix("0098") {
        return format!("0{rest}");
    }
    if let Some(rest) = digits.strip_prefix("98") {
        // "98..." is only a country code when what follows is a 10-digit
        // mobile body; otherwise it is a local number starting 98.
        if rest.len() == 10 && rest.starts_with('9') {
            return format!("0{rest}");
        }
    }
    if digits.len() == 10 && digits.starts_with('9') {
        return format!("0{digits}");
    }

    digits
}

/// Validate that a (already normalized) mobile number is canonical.
pub fn validate_mobile(phone: &str) -> Result<(), String> {
    if phone.len() != MOBILE_LEN {
        return Err(format!(
            "Mobile number must be {MOBILE_LEN} digits, got {} ('{phone}')",
            phone.len()
        ));
    }
    if !phone.starts_with(MOBILE_PREFIX) {
        return Err(format!("Mobile number must start with {MOBILE_PREFIX}"));
    }
    if !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err("Mobile number must contain only digits".to_string());
    }
    Ok(())
}

/// Normalize and validate in one step.
pub fn normalize_and_validate(input: &str) -> Result<String, String> {
    let phone = normalize_mobile(input);
    validate_mobile(&phone)?;
    Ok(phone)
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Normalization
    // -----------------------------------------------------------------------

    #[test]
    fn test_plus_98_with_spaces() {
        assert_eq!(normalize_mobile("+98 912 345 6789"), "09123456789");
    }

    #[test]
    fn test_double_zero_98() {
        assert_eq!(normalize_mobile("00989123456789"), "09123456789");
    }

    #[test]
    fn test_bare_98_prefix() {
        assert_eq!(normalize_mobile("989123456789"), "09123456789");
    }

    #[test]
    fn test_ten_digits_starting_nine() {
        assert_eq!(normalize_mobile("9123456789"), "09123456789");
    }

    #[test]
    fn test_already_canonical() {
        assert_eq!(normalize_mobile("09123456789"), "09123456789");
    }

    #[test]
    fn test_dashes_and_parens_stripped() {
        assert_eq!(normalize_mobile("0912-345-6789"), "09123456789");
        assert_eq!(normalize_mobile("(0912) 345 6789"), "09123456789");
    }

    #[test]
    fn test_persian_numerals() {
        assert_eq!(normalize_mobile("۰۹۱۲۳۴۵۶۷۸۹"), "09123456789");
    }

    #[test]
    fn test_arabic_numerals() {
        assert_eq!(normalize_mobile("٠٩١٢٣٤٥٦٧٨٩"), "09123456789");
    }

    #[test]
    fn test_persian_with_country_code() {
        assert_eq!(normalize_mobile("+۹۸۹۱۲۳۴۵۶۷۸۹"), "09123456789");
    }

    #[test]
    fn test_short_input_stays_short() {
        // Short garbage normalizes to a short string; validation rejects it.
        assert_eq!(normalize_mobile("12345"), "12345");
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    #[test]
    fn test_valid_mobile_passes() {
        assert!(validate_mobile("09123456789").is_ok());
    }

    #[test]
    fn test_short_mobile_rejected() {
        let result = validate_mobile("0912345");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("11 digits"));
    }

    #[test]
    fn test_wrong_prefix_rejected() {
        let result = validate_mobile("19123456789");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("start with 09"));
    }

    #[test]
    fn test_landline_rejected() {
        // 021 Tehran landline is 11 digits but not 09-prefixed.
        assert!(validate_mobile("02112345678").is_err());
    }

    #[test]
    fn test_empty_rejected() {
        assert!(validate_mobile("").is_err());
    }

    // -----------------------------------------------------------------------
    // Combined
    // -----------------------------------------------------------------------

    #[test]
    fn test_normalize_and_validate_roundtrip() {
        assert_eq!(
            normalize_and_validate("+98 912 345 6789").unwrap(),
            "09123456789"
        );
    }

    #[test]
    fn test_normalize_and_validate_rejects_garbage() {
        assert!(normalize_and_validate("not a phone").is_err());
    }
}
