use std::fs;
use std::path::Path;
use thiserror::Error;
use wac_core::contact_contracts::{parse_flag_token, ContactEntry};
use wac_core::phone::normalize_phone;
use wac_storage::{ContactStore, StorageError};

pub const ROSTER_HEADER: [&str; 3] = ["phone", "has_whatsapp", "note"];

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("missing header row, expected phone,has_whatsapp,note")]
    MissingHeader,
    #[error("line {line}: {message}")]
    Row { line: usize, message: String },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RosterImportReport {
    pub rows_read: usize,
    pub inserted: usize,
    pub updated: usize,
}

/// Read a roster CSV and apply it to the store as one batch. Any malformed
/// row aborts the import before a single record is written, so a failed
/// import leaves the store exactly as it was.
pub fn import_roster(
    store: &mut ContactStore,
    path: impl AsRef<Path>,
) -> Result<RosterImportReport, IngestError> {
    let content = fs::read_to_string(path)?;
    let entries = parse_roster(&content)?;
    let counts = store.bulk_import(&entries)?;

    Ok(RosterImportReport {
        rows_read: entries.len(),
        inserted: counts.inserted,
        updated: counts.updated,
    })
}

/// Parse roster CSV text into normalized entries. The first non-empty line
/// must be the `phone,has_whatsapp,note` header; blank lines are skipped.
pub fn parse_roster(content: &str) -> Result<Vec<ContactEntry>, IngestError> {
    let mut lines = content.lines().enumerate();

    let header = loop {
        match lines.next() {
            Some((_, line)) if line.trim().is_empty() => continue,
            Some((_, line)) => break line,
            None => return Err(IngestError::MissingHeader),
        }
    };
    if !is_roster_header(header) {
        return Err(IngestError::MissingHeader);
    }

    let mut entries = Vec::new();
    for (index, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        entries.push(parse_row(index + 1, line)?);
    }

    Ok(entries)
}

fn is_roster_header(line: &str) -> bool {
    let fields = split_fields(line);
    fields.len() == ROSTER_HEADER.len()
        && fields
            .iter()
            .zip(ROSTER_HEADER)
            .all(|(field, expected)| field.eq_ignore_ascii_case(expected))
}

fn parse_row(line_number: usize, line: &str) -> Result<ContactEntry, IngestError> {
    let fields = split_fields(line);
    if fields.len() < 2 || fields.len() > 3 {
        return Err(IngestError::Row {
            line: line_number,
            message: format!("expected 2 or 3 fields, found {}", fields.len()),
        });
    }

    let phone_key = normalize_phone(&fields[0]).map_err(|err| IngestError::Row {
        line: line_number,
        message: err.to_string(),
    })?;

    let has_whatsapp = parse_flag_token(&fields[1])
        .as_bool()
        .ok_or_else(|| IngestError::Row {
            line: line_number,
            message: format!("unrecognized flag token {:?}", fields[1]),
        })?;

    let note = fields
        .get(2)
        .filter(|note| !note.is_empty())
        .map(|note| note.to_string());

    Ok(ContactEntry {
        phone_key,
        has_whatsapp,
        note,
    })
}

// Comma split with double-quote support; a doubled quote inside a quoted
// field is a literal quote.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());

    fields
}
