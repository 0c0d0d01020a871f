//! SQLite-backed local diary.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OpenFlags};
use tracing::info;

use super::row::EntryRow;
use super::{forget, EntryStore};
use crate::entry::Entry;
use crate::error::{DiaryError, DiaryResult};
use crate::fs::{remove_dir_if_exists, remove_file_if_exists};
use crate::registry::Registry;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS entries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        text TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
"#;

/// Diary whose entries live in `basedir/<name>/entries.sqlite`.
#[derive(Clone)]
pub struct LocalDiary {
    name: String,
    path: PathBuf,
    registry: Arc<Registry>,
}

impl std::fmt::Debug for LocalDiary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalDiary")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish()
    }
}

impl PartialEq for LocalDiary {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.path == other.path
    }
}

impl Eq for LocalDiary {}

impl LocalDiary {
    pub(crate) fn new(name: impl Into<String>, registry: Arc<Registry>) -> Self {
        let name = name.into();
        let path = registry.entries_path(&name);
        Self {
            name,
            path,
            registry,
        }
    }

    /// Create (or open) the entries database at `path`.
    pub(crate) fn create_storage(path: &Path) -> DiaryResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Location of the entries database.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the existing database without creating it, so a deleted diary
    /// stays deleted.
    fn open_conn(&self) -> DiaryResult<Connection> {
        if !self.path.is_file() {
            return Err(DiaryError::NotFound(self.name.clone()));
        }
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(conn)
    }

    /// Insert an entry with an explicit creation time. Used when migrating
    /// entries so their timestamps survive.
    pub(crate) fn insert_entry(&self, text: &str, date: DateTime<Utc>) -> DiaryResult<Entry> {
        if text.trim().is_empty() {
            return Err(DiaryError::EmptyEntry);
        }
        let conn = self.open_conn()?;
        conn.execute(
            "INSERT INTO entries (text, created_at) VALUES (?, ?)",
            (text, date.to_rfc3339()),
        )?;
        let id = conn.last_insert_rowid();
        let id = u64::try_from(id)
            .map_err(|_| DiaryError::Storage(format!("Invalid entry id: {}", id)))?;
        Ok(Entry::new(id, text, date))
    }

    /// Drop the entries database but keep the registry record and the
    /// diary directory.
    pub(crate) fn remove_storage(&self) -> DiaryResult<()> {
        remove_file_if_exists(&self.path)?;
        Ok(())
    }
}

impl EntryStore for LocalDiary {
    fn name(&self) -> &str {
        &self.name
    }

    fn add_entry(&self, text: &str) -> DiaryResult<Entry> {
        self.insert_entry(text, Utc::now())
    }

    fn get_entries(&self) -> DiaryResult<Vec<Entry>> {
        let conn = self.open_conn()?;
        let mut stmt = conn.prepare("SELECT id, text, created_at FROM entries ORDER BY id")?;
        let rows = stmt.query_map([], EntryRow::from_row)?;

        let mut entries: Vec<Entry> = Vec::new();
        for row in rows {
            entries.push(Entry::try_from(row?)?);
        }
        Ok(entries)
    }

    fn remove_entry(&self, id: u64) -> DiaryResult<()> {
        let rowid = i64::try_from(id).map_err(|_| DiaryError::EntryNotFound(id))?;
        let conn = self.open_conn()?;
        let removed = conn.execute("DELETE FROM entries WHERE id = ?", [rowid])?;
        if removed == 0 {
            return Err(DiaryError::EntryNotFound(id));
        }
        Ok(())
    }

    fn delete(&self) -> DiaryResult<()> {
        remove_dir_if_exists(&self.registry.diary_dir(&self.name))?;
        forget(&self.registry, &self.name)?;
        info!(diary = %self.name, "deleted local diary");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryFile;
    use tempfile::tempdir;

    fn diary(dir: &Path, name: &str) -> LocalDiary {
        let registry = Arc::new(Registry::new(dir.to_path_buf(), RegistryFile::bootstrap()));
        let diary = LocalDiary::new(name, registry);
        LocalDiary::create_storage(diary.path()).unwrap();
        diary
    }

    #[test]
    fn test_ids_are_not_reused_after_removal() {
        let dir = tempdir().unwrap();
        let diary = diary(dir.path(), "default");

        let first = diary.add_entry("Text 1").unwrap();
        let second = diary.add_entry("Text 2").unwrap();
        diary.remove_entry(second.id).unwrap();
        let third = diary.add_entry("Text 3").unwrap();

        assert!(first.id < second.id);
        assert!(third.id > second.id);
    }

    #[test]
    fn test_blank_text_is_rejected() {
        let dir = tempdir().unwrap();
        let diary = diary(dir.path(), "default");
        assert!(matches!(
            diary.add_entry("  \n"),
            Err(DiaryError::EmptyEntry)
        ));
        assert!(diary.get_entries().unwrap().is_empty());
    }

    #[test]
    fn test_missing_storage_is_not_recreated() {
        let dir = tempdir().unwrap();
        let diary = diary(dir.path(), "default");
        diary.remove_storage().unwrap();

        assert!(matches!(
            diary.get_entries(),
            Err(DiaryError::NotFound(_))
        ));
        assert!(!diary.path().exists());
    }

    #[test]
    fn test_insert_entry_keeps_timestamp() {
        let dir = tempdir().unwrap();
        let diary = diary(dir.path(), "default");
        let date = DateTime::parse_from_rfc3339("2020-02-29T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        diary.insert_entry("leap", date).unwrap();
        let entries = diary.get_entries().unwrap();
        assert_eq!(entries[0].date, date);
    }
}
