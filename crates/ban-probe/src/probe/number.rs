//! Phone number normalization into country code and national number.

use serde::Serialize;

/// A phone number split into its country calling code and national part.
///
/// Both fields are non-empty ASCII digit strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedNumber {
    #[serde(rename = "cc")]
    pub country_code: String,
    #[serde(rename = "in")]
    pub national_number: String,
}

const MIN_DIGITS: usize = 6;
const MAX_DIGITS: usize = 15;

/// Numbers shorter than this are assumed to carry a one-digit country code.
const TWO_DIGIT_CC_MIN_LEN: usize = 8;

/// Parse a free-form number such as `"+6281234567890"`.
///
/// Accepts one optional leading `+` followed by 6 to 15 ASCII digits,
/// surrounded by optional whitespace.
pub fn normalize_number(input: &str) -> Result<NormalizedNumber, String> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);

    if digits.len() < MIN_DIGITS || digits.len() > MAX_DIGITS {
        return Err(format!(
            "expected {}-{} digits, got {}",
            MIN_DIGITS,
            MAX_DIGITS,
            digits.len()
        ));
    }

    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err("number must contain only digits after an optional '+'".into());
    }

    let prefix_len = if digits.len() < TWO_DIGIT_CC_MIN_LEN { 1 } else { 2 };
    let (prefix, national) = digits.split_at(prefix_len);

    let (country_code, national) = match prefix.trim_start_matches('0') {
        "" => digits.split_at(1),
        cc => (cc, national),
    };

    if national.is_empty() {
        return Err("national number is empty".into());
    }

    Ok(NormalizedNumber {
        country_code: country_code.to_string(),
        national_number: national.to_string(),
    })
}
