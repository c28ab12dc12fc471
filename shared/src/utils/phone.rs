//! Phone number utilities

use once_cell::sync::Lazy;
use regex::Regex;

// E.164: '+', country code without leading zero, 7 to 15 digits in total
static E164_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+[1-9]\d{6,14}$").expect("E.164 pattern is valid")
});

/// Remove common formatting characters (spaces, dashes, dots, parentheses)
pub fn strip_formatting(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect()
}

/// Normalize a phone number to E.164
///
/// A leading `00` international prefix is rewritten to `+`. Returns `None`
/// when the result is not a valid E.164 number.
pub fn normalize_e164(phone: &str) -> Option<String> {
    let stripped = strip_formatting(phone.trim());
    let candidate = match stripped.strip_prefix("00") {
        Some(rest) => format!("+{}", rest),
        None => stripped,
    };

    if E164_REGEX.is_match(&candidate) {
        Some(candidate)
    } else {
        None
    }
}

/// Check if a phone number is already in canonical E.164 form
pub fn is_e164(phone: &str) -> bool {
    E164_REGEX.is_match(phone)
}

/// Digits only, as SMS providers expect (`+905551234567` -> `905551234567`)
pub fn digits_only(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Mask a phone number for logs, keeping the last four digits
pub fn mask_phone_number(phone: &str) -> String {
    let len = phone.chars().count();
    if len <= 4 {
        return "*".repeat(len);
    }

    let visible: String = phone.chars().skip(len - 4).collect();
    if phone.starts_with('+') {
        format!("+{}{}", "*".repeat(len - 5), visible)
    } else {
        format!("{}{}", "*".repeat(len - 4), visible)
    }
}
