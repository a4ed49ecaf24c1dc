use thiserror::Error;
use wac_core::contact_contracts::parse_flag_token;
use wac_core::phone::normalize_phone;
use wac_storage::{ContactStore, StorageError};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Reply for the check-by-number intent. User-correctable problems (bad
/// phone text, unknown number) become reply text; storage failures bubble up.
pub fn check_reply(store: &ContactStore, raw_phone: &str) -> Result<String, CommandError> {
    let phone_key = match normalize_phone(raw_phone) {
        Ok(phone_key) => phone_key,
        Err(err) => return Ok(format!("Error: {err}.")),
    };

    match store.contact(&phone_key)? {
        None => Ok(format!(
            "No record for {phone_key}. Add one with: set <number> <yes|no> [note]."
        )),
        Some(record) => {
            let status = if record.has_whatsapp {
                "has"
            } else {
                "does not have"
            };
            let mut reply = format!("Number {phone_key} {status} WhatsApp.");
            if let Some(note) = record.note.as_deref().filter(|note| !note.is_empty()) {
                reply.push_str(&format!("\nNote: {note}"));
            }
            Ok(reply)
        }
    }
}

/// Reply for the set-by-number intent. The flag token must parse to a
/// decided yes/no; anything else gets a corrective reply instead of a write.
pub fn set_reply(
    store: &ContactStore,
    raw_phone: &str,
    flag_token: &str,
    note: Option<&str>,
) -> Result<String, CommandError> {
    let phone_key = match normalize_phone(raw_phone) {
        Ok(phone_key) => phone_key,
        Err(err) => return Ok(format!("Error: {err}.")),
    };

    let Some(has_whatsapp) = parse_flag_token(flag_token).as_bool() else {
        return Ok(format!(
            "Flag {flag_token:?} not recognized. Use yes/no, y/n, 1/0 or true/false."
        ));
    };

    let note = note.map(str::trim).filter(|note| !note.is_empty());
    store.upsert_contact(&phone_key, has_whatsapp, note)?;

    let status = if has_whatsapp { "has" } else { "no" };
    let note_text = note.map(|note| format!(" ({note})")).unwrap_or_default();
    Ok(format!("Saved: {phone_key} -> {status} WhatsApp{note_text}"))
}

/// Reply for the aggregate-stats intent.
pub fn stats_reply(store: &ContactStore) -> Result<String, CommandError> {
    let stats = store.stats()?;
    if stats.total == 0 {
        return Ok("No contacts on record yet. Add one with the set command.".to_string());
    }
    Ok(format!(
        "{} contacts on record, WhatsApp found for {}.",
        stats.total, stats.with_whatsapp
    ))
}
