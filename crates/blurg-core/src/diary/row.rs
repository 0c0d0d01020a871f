//! Entry row type for local diary queries.

use chrono::{DateTime, Utc};

use crate::entry::Entry;
use crate::error::{DiaryError, DiaryResult};

/// Raw row data from the entries table, before parsing into an [`Entry`].
#[derive(Debug)]
pub struct EntryRow {
    pub id: i64,
    pub text: String,
    pub created_at: String,
}

impl EntryRow {
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            text: row.get(1)?,
            created_at: row.get(2)?,
        })
    }
}

impl TryFrom<EntryRow> for Entry {
    type Error = DiaryError;

    fn try_from(row: EntryRow) -> DiaryResult<Self> {
        let id = u64::try_from(row.id)
            .map_err(|_| DiaryError::Storage(format!("Invalid entry id: {}", row.id)))?;
        let date = DateTime::parse_from_rfc3339(&row.created_at)
            .map_err(|e| DiaryError::Storage(format!("Invalid timestamp: {}", e)))?
            .with_timezone(&Utc);
        Ok(Entry::new(id, row.text, date))
    }
}
