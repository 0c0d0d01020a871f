//! Diaries and their storage backends.
//!
//! A [`Diary`] is either a [`LocalDiary`] (SQLite file under the base
//! directory) or a [`RemoteDiary`] (entries held by a diary server, reached
//! with a per-diary key). Both implement [`EntryStore`], the capability
//! surface callers use without caring where entries live.

mod local;
mod remote;
mod row;

use crate::entry::Entry;
use crate::error::DiaryResult;
use crate::names::DEFAULT_DIARY;
use crate::registry::{DiaryKind, LocalRecord, Registry};

pub use local::LocalDiary;
pub use remote::RemoteDiary;

/// Entry CRUD shared by every diary variant.
///
/// Reads always go to the backend; nothing is cached between calls.
pub trait EntryStore {
    fn name(&self) -> &str;

    /// Append an entry and persist it immediately.
    ///
    /// # Errors
    ///
    /// Returns `DiaryError::EmptyEntry` for blank text.
    fn add_entry(&self, text: &str) -> DiaryResult<Entry>;

    /// All entries in id order.
    fn get_entries(&self) -> DiaryResult<Vec<Entry>>;

    /// # Errors
    ///
    /// Returns `DiaryError::EntryNotFound` if no entry has this id.
    fn remove_entry(&self, id: u64) -> DiaryResult<()>;

    /// Remove all entries, the diary's storage and its registry record.
    fn delete(&self) -> DiaryResult<()>;
}

/// A diary of either variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diary {
    Local(LocalDiary),
    Remote(RemoteDiary),
}

impl Diary {
    pub fn kind(&self) -> DiaryKind {
        match self {
            Diary::Local(_) => DiaryKind::Local,
            Diary::Remote(_) => DiaryKind::Remote,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Diary::Remote(_))
    }

    pub fn as_local(&self) -> Option<&LocalDiary> {
        match self {
            Diary::Local(diary) => Some(diary),
            Diary::Remote(_) => None,
        }
    }

    pub fn as_remote(&self) -> Option<&RemoteDiary> {
        match self {
            Diary::Remote(diary) => Some(diary),
            Diary::Local(_) => None,
        }
    }
}

impl From<LocalDiary> for Diary {
    fn from(diary: LocalDiary) -> Self {
        Diary::Local(diary)
    }
}

impl From<RemoteDiary> for Diary {
    fn from(diary: RemoteDiary) -> Self {
        Diary::Remote(diary)
    }
}

impl EntryStore for Diary {
    fn name(&self) -> &str {
        match self {
            Diary::Local(d) => d.name(),
            Diary::Remote(d) => d.name(),
        }
    }

    fn add_entry(&self, text: &str) -> DiaryResult<Entry> {
        match self {
            Diary::Local(d) => d.add_entry(text),
            Diary::Remote(d) => d.add_entry(text),
        }
    }

    fn get_entries(&self) -> DiaryResult<Vec<Entry>> {
        match self {
            Diary::Local(d) => d.get_entries(),
            Diary::Remote(d) => d.get_entries(),
        }
    }

    fn remove_entry(&self, id: u64) -> DiaryResult<()> {
        match self {
            Diary::Local(d) => d.remove_entry(id),
            Diary::Remote(d) => d.remove_entry(id),
        }
    }

    fn delete(&self) -> DiaryResult<()> {
        match self {
            Diary::Local(d) => d.delete(),
            Diary::Remote(d) => d.delete(),
        }
    }
}

/// Drop `name` from the registry. If it was the current diary, the pointer
/// falls back to `default`, which is re-created empty when missing.
pub(crate) fn forget(registry: &Registry, name: &str) -> DiaryResult<()> {
    registry.update(|file| {
        file.remove(name);
        if file.current == name {
            file.current = DEFAULT_DIARY.to_string();
            if file.kind_of(DEFAULT_DIARY).is_none() {
                LocalDiary::create_storage(&registry.entries_path(DEFAULT_DIARY))?;
                file.local.push(LocalRecord {
                    name: DEFAULT_DIARY.to_string(),
                });
            }
        }
        Ok(())
    })?;
    Ok(())
}
