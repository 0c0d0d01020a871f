//! Server-backed remote diary.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::{forget, EntryStore};
use crate::api::{RemoteClient, Verification};
use crate::entry::Entry;
use crate::error::{DiaryError, DiaryResult};
use crate::fs::{remove_dir_if_exists, write_atomic};
use crate::registry::{Registry, RemoteRecord};

/// Diary whose entries are held by a diary server.
///
/// The key issued by the server at creation is cached in
/// `basedir/<name>/key` and sent with every request.
#[derive(Clone)]
pub struct RemoteDiary {
    name: String,
    username: String,
    key: String,
    client: RemoteClient,
    registry: Arc<Registry>,
}

impl std::fmt::Debug for RemoteDiary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteDiary")
            .field("name", &self.name)
            .field("base_url", &self.client.base_url())
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl PartialEq for RemoteDiary {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.key == other.key
            && self.client.base_url() == other.client.base_url()
    }
}

impl Eq for RemoteDiary {}

impl RemoteDiary {
    pub(crate) fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        key: impl Into<String>,
        client: RemoteClient,
        registry: Arc<Registry>,
    ) -> Self {
        Self {
            name: name.into(),
            username: username.into(),
            key: key.into(),
            client,
            registry,
        }
    }

    /// Rebuild a handle from its registry record and cached key file.
    pub(crate) fn load(
        record: &RemoteRecord,
        client: RemoteClient,
        registry: Arc<Registry>,
    ) -> DiaryResult<Self> {
        let key = Self::read_key(&registry.key_path(&record.name))
            .map_err(|e| DiaryError::Storage(format!("key for \"{}\": {}", record.name, e)))?;
        Ok(Self::new(
            record.name.clone(),
            record.username.clone(),
            key,
            client,
            registry,
        ))
    }

    pub(crate) fn read_key(path: &Path) -> DiaryResult<String> {
        let key = fs::read_to_string(path)?.trim().to_string();
        if key.is_empty() {
            return Err(DiaryError::Storage("key file is empty".to_string()));
        }
        Ok(key)
    }

    /// Cache a diary key, readable only by the owner on Unix.
    pub(crate) fn write_key(path: &Path, key: &str) -> DiaryResult<()> {
        write_atomic(path, key.as_bytes())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Secret sent as the Basic auth username on every API call.
    pub fn get_diarykey(&self) -> &str {
        &self.key
    }

    /// Connection parameters: `key`, `base_url` and `username`.
    pub fn params(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            ("key", self.key.clone()),
            ("base_url", self.base_url().to_string()),
            ("username", self.username.clone()),
        ])
    }

    /// Ask the server whether the cached key is still valid.
    pub fn verify(&self) -> DiaryResult<Verification> {
        self.client.verify(&self.key)
    }

    /// Wipe the server-side diary without touching local state.
    pub(crate) fn wipe(&self) -> DiaryResult<()> {
        self.client.wipe(&self.key)
    }

    pub(crate) fn record(&self) -> RemoteRecord {
        RemoteRecord {
            name: self.name.clone(),
            base_url: self.base_url().to_string(),
            username: self.username.clone(),
        }
    }
}

impl EntryStore for RemoteDiary {
    fn name(&self) -> &str {
        &self.name
    }

    fn add_entry(&self, text: &str) -> DiaryResult<Entry> {
        if text.trim().is_empty() {
            return Err(DiaryError::EmptyEntry);
        }
        if let Some(entry) = self.client.log(&self.key, text)? {
            return Ok(entry);
        }
        self.client
            .list(&self.key)?
            .into_iter()
            .max_by_key(|entry| entry.id)
            .ok_or_else(|| DiaryError::Protocol("logged entry missing from list".to_string()))
    }

    fn get_entries(&self) -> DiaryResult<Vec<Entry>> {
        self.client.list(&self.key)
    }

    fn remove_entry(&self, id: u64) -> DiaryResult<()> {
        self.client.remove(&self.key, id)
    }

    fn delete(&self) -> DiaryResult<()> {
        self.wipe()?;
        remove_dir_if_exists(&self.registry.diary_dir(&self.name))?;
        forget(&self.registry, &self.name)?;
        info!(diary = %self.name, base_url = %self.base_url(), "deleted remote diary");
        Ok(())
    }
}
