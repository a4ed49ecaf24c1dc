pub mod contact_contracts;
pub mod phone;

pub use contact_contracts::{
    parse_flag_token, ContactEntry, ContactRecord, ContactStats, FlagToken,
};
pub use phone::{normalize_phone, PhoneFormatError, MAX_PHONE_DIGITS, MIN_PHONE_DIGITS};
