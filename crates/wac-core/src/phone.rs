use thiserror::Error;

pub const MIN_PHONE_DIGITS: usize = 7;
pub const MAX_PHONE_DIGITS: usize = 15;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PhoneFormatError {
    #[error("phone number must contain digits")]
    NoDigits,
    #[error("phone number has {found} digits, expected between 7 and 15")]
    ImplausibleLength { found: usize },
}

/// Collapse a raw phone string to its canonical key: ASCII digits only.
///
/// Country-code digits are kept exactly as typed; a leading `+`, spacing,
/// and punctuation are dropped. The same rule is applied to every input,
/// so any two spellings of one digit sequence collide to one key.
pub fn normalize_phone(raw: &str) -> Result<String, PhoneFormatError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(PhoneFormatError::NoDigits);
    }
    let found = digits.len();
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&found) {
        return Err(PhoneFormatError::ImplausibleLength { found });
    }
    Ok(digits)
}
