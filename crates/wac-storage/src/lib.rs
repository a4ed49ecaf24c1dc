use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::Path;
use thiserror::Error;
use wac_core::contact_contracts::{ContactEntry, ContactRecord, ContactStats};

pub const CONTACTS_SCHEMA_VERSION: i64 = 1;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("timestamp parse error: {0}")]
    Timestamp(String),
    #[error("unsupported schema version {found}, max supported {supported}")]
    UnsupportedSchemaVersion { found: i64, supported: i64 },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportCounts {
    pub inserted: usize,
    pub updated: usize,
}

/// File-backed contact table. One connection, one writer, every call is a
/// single synchronous unit of work.
pub struct ContactStore {
    conn: Connection,
}

impl ContactStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn schema_version(&self) -> Result<i64, StorageError> {
        Ok(self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }

    pub fn migrate(&self) -> Result<(), StorageError> {
        let current = self.schema_version()?;
        if current > CONTACTS_SCHEMA_VERSION {
            return Err(StorageError::UnsupportedSchemaVersion {
                found: current,
                supported: CONTACTS_SCHEMA_VERSION,
            });
        }

        if current < 1 {
            let sql = include_str!("../migrations/0001_contacts_schema.sql");
            self.conn.execute_batch(sql)?;
            self.conn
                .execute("PRAGMA user_version = 1", [])
                .map(|_| ())?;
        }

        Ok(())
    }

    pub fn contact(&self, phone_key: &str) -> Result<Option<ContactRecord>, StorageError> {
        let record = self
            .conn
            .query_row(
                "
                SELECT phone_key, has_whatsapp, note, updated_at
                FROM contacts
                WHERE phone_key = ?1
                ",
                [phone_key],
                |row| {
                    let updated_at =
                        parse_timestamp(row.get::<_, String>(3)?).map_err(|err| {
                            rusqlite::Error::FromSqlConversionFailure(
                                3,
                                rusqlite::types::Type::Text,
                                Box::new(err),
                            )
                        })?;

                    Ok(ContactRecord {
                        phone_key: row.get(0)?,
                        has_whatsapp: row.get::<_, i64>(1)? != 0,
                        note: row.get(2)?,
                        updated_at,
                    })
                },
            )
            .optional()?;

        Ok(record)
    }

    pub fn upsert_contact(
        &self,
        phone_key: &str,
        has_whatsapp: bool,
        note: Option<&str>,
    ) -> Result<(), StorageError> {
        self.conn.execute(
            "
            INSERT INTO contacts (
                phone_key,
                has_whatsapp,
                note,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(phone_key) DO UPDATE SET
                has_whatsapp=excluded.has_whatsapp,
                note=excluded.note,
                updated_at=excluded.updated_at
            ",
            params![
                phone_key,
                i64::from(has_whatsapp),
                note,
                Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Apply a batch of upserts inside one transaction. Either every row
    /// lands or none does. A key appearing twice in the batch resolves to
    /// its last occurrence, matching single-row upsert semantics; the second
    /// occurrence counts as an update.
    pub fn bulk_import(&mut self, entries: &[ContactEntry]) -> Result<ImportCounts, StorageError> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let mut counts = ImportCounts::default();

        {
            let mut exists_stmt =
                tx.prepare("SELECT 1 FROM contacts WHERE phone_key = ?1 LIMIT 1")?;
            let mut upsert_stmt = tx.prepare(
                "
                INSERT INTO contacts (
                    phone_key,
                    has_whatsapp,
                    note,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(phone_key) DO UPDATE SET
                    has_whatsapp=excluded.has_whatsapp,
                    note=excluded.note,
                    updated_at=excluded.updated_at
                ",
            )?;

            for entry in entries {
                let exists = exists_stmt
                    .query_row([entry.phone_key.as_str()], |_| Ok(()))
                    .optional()?
                    .is_some();

                upsert_stmt.execute(params![
                    entry.phone_key,
                    i64::from(entry.has_whatsapp),
                    entry.note,
                    now,
                ])?;

                if exists {
                    counts.updated += 1;
                } else {
                    counts.inserted += 1;
                }
            }
        }

        tx.commit()?;
        Ok(counts)
    }

    pub fn stats(&self) -> Result<ContactStats, StorageError> {
        let (total, with_whatsapp) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(has_whatsapp), 0) FROM contacts",
            [],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )?;

        Ok(ContactStats {
            total: total as u64,
            with_whatsapp: with_whatsapp as u64,
        })
    }

    pub fn table_exists(&self, table_name: &str) -> Result<bool, StorageError> {
        let exists = self
            .conn
            .query_row(
                "
                SELECT 1
                FROM sqlite_master
                WHERE type='table' AND name = ?1
                LIMIT 1
                ",
                [table_name],
                |_| Ok(()),
            )
            .optional()?;
        Ok(exists.is_some())
    }
}

fn parse_timestamp(value: String) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(&value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|err| StorageError::Timestamp(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn entry(phone_key: &str, has_whatsapp: bool, note: Option<&str>) -> ContactEntry {
        ContactEntry {
            phone_key: phone_key.to_string(),
            has_whatsapp,
            note: note.map(str::to_string),
        }
    }

    #[test]
    fn migration_creates_contacts_table() {
        let db = ContactStore::open_in_memory().expect("open db");
        assert!(db.table_exists("contacts").expect("table check"));
        assert_eq!(
            db.schema_version().expect("schema version"),
            CONTACTS_SCHEMA_VERSION
        );
    }

    #[test]
    fn upsert_then_lookup_roundtrip() {
        let db = ContactStore::open_in_memory().expect("open db");
        db.upsert_contact("79990001122", true, Some("client"))
            .expect("upsert");

        let record = db
            .contact("79990001122")
            .expect("lookup")
            .expect("record present");
        assert_eq!(record.phone_key, "79990001122");
        assert!(record.has_whatsapp);
        assert_eq!(record.note.as_deref(), Some("client"));
    }

    #[test]
    fn lookup_of_absent_key_is_none_not_an_error() {
        let db = ContactStore::open_in_memory().expect("open db");
        assert!(db.contact("70000000000").expect("lookup").is_none());
    }

    #[test]
    fn second_upsert_wins_and_bumps_updated_at() {
        let db = ContactStore::open_in_memory().expect("open db");
        db.upsert_contact("79990001122", true, Some("first"))
            .expect("first upsert");
        let first = db
            .contact("79990001122")
            .expect("lookup")
            .expect("record present");

        db.upsert_contact("79990001122", false, None)
            .expect("second upsert");
        let second = db
            .contact("79990001122")
            .expect("lookup")
            .expect("record present");

        assert!(!second.has_whatsapp);
        assert_eq!(second.note, None);
        assert!(second.updated_at >= first.updated_at);
    }

    #[test]
    fn bulk_import_resolves_in_batch_duplicates_to_last_occurrence() {
        let file = NamedTempFile::new().expect("temp db");
        let mut db = ContactStore::open(file.path()).expect("open db");

        let counts = db
            .bulk_import(&[
                entry("79990000000", true, None),
                entry("79990000001", false, None),
                entry("79990000000", false, Some("updated")),
            ])
            .expect("bulk import");
        assert_eq!(
            counts,
            ImportCounts {
                inserted: 2,
                updated: 1,
            }
        );

        let record = db
            .contact("79990000000")
            .expect("lookup")
            .expect("record present");
        assert!(!record.has_whatsapp);
        assert_eq!(record.note.as_deref(), Some("updated"));

        let stats = db.stats().expect("stats");
        assert_eq!(stats.total, 2);
        assert_eq!(stats.with_whatsapp, 0);
    }

    #[test]
    fn bulk_import_updates_existing_rows() {
        let db_file = NamedTempFile::new().expect("temp db");
        let mut db = ContactStore::open(db_file.path()).expect("open db");
        db.upsert_contact("79990000000", false, None)
            .expect("seed record");

        let counts = db
            .bulk_import(&[
                entry("79990000000", true, Some("VIP")),
                entry("79990000002", true, None),
            ])
            .expect("bulk import");
        assert_eq!(
            counts,
            ImportCounts {
                inserted: 1,
                updated: 1,
            }
        );

        let stats = db.stats().expect("stats");
        assert_eq!(stats.total, 2);
        assert_eq!(stats.with_whatsapp, 2);
    }

    #[test]
    fn stats_on_empty_store_are_zero() {
        let db = ContactStore::open_in_memory().expect("open db");
        assert_eq!(db.stats().expect("stats"), ContactStats::default());
    }

    #[test]
    fn open_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("contacts.db");
        let db = ContactStore::open(&path).expect("open db");
        db.upsert_contact("79990001122", true, None)
            .expect("upsert");
        assert!(path.exists());
    }

    #[test]
    fn store_survives_reopen() {
        let file = NamedTempFile::new().expect("temp db");
        {
            let db = ContactStore::open(file.path()).expect("open db");
            db.upsert_contact("79990001122", true, Some("kept"))
                .expect("upsert");
        }

        let db = ContactStore::open(file.path()).expect("reopen db");
        let record = db
            .contact("79990001122")
            .expect("lookup")
            .expect("record present");
        assert!(record.has_whatsapp);
        assert_eq!(record.note.as_deref(), Some("kept"));
    }
}
