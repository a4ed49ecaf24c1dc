use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted contact, keyed by its canonical phone digits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactRecord {
    pub phone_key: String,
    pub has_whatsapp: bool,
    #[serde(default)]
    pub note: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// One bulk-import row. The phone key is expected to be normalized already.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactEntry {
    pub phone_key: String,
    pub has_whatsapp: bool,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactStats {
    pub total: u64,
    pub with_whatsapp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagToken {
    Yes,
    No,
    Unrecognized,
}

impl FlagToken {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            FlagToken::Yes => Some(true),
            FlagToken::No => Some(false),
            FlagToken::Unrecognized => None,
        }
    }
}

/// Parse a user-supplied yes/no token into a tagged result. Anything outside
/// the known vocabulary is `Unrecognized`, never silently coerced.
pub fn parse_flag_token(raw: &str) -> FlagToken {
    match raw.trim().to_lowercase().as_str() {
        "1" | "y" | "yes" | "true" => FlagToken::Yes,
        "0" | "n" | "no" | "false" => FlagToken::No,
        _ => FlagToken::Unrecognized,
    }
}
