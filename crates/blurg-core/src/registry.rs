//! Persisted diary registry.
//!
//! The registry is a TOML document stored in a file named `config` directly
//! under the base directory:
//!
//! ```toml
//! current = "default"
//!
//! [[local]]
//! name = "default"
//!
//! [[remote]]
//! name = "travel"
//! base_url = "http://localhost:5000"
//! username = "me"
//!
//! [defaults]
//! base_url = "http://localhost:5000"
//! username = "me"
//! ```
//!
//! Every diary also owns `basedir/<name>/`: `entries.sqlite` for a local
//! diary, the cached `key` file for a remote one.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::fs::write_atomic;
use crate::names::{CONFIG_NAME, DEFAULT_DIARY};

/// File holding a local diary's entries.
pub const ENTRIES_FILE: &str = "entries.sqlite";

/// File holding a remote diary's key.
pub const KEY_FILE: &str = "key";

/// Storage variant of a diary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiaryKind {
    Local,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalRecord {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub name: String,
    pub base_url: String,
    pub username: String,
}

/// Server and user offered to new remote diaries when none is given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// On-disk registry contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryFile {
    pub current: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub local: Vec<LocalRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remote: Vec<RemoteRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<RemoteDefaults>,
}

impl RegistryFile {
    /// Registry of a fresh base directory: one local `default` diary, current.
    pub fn bootstrap() -> Self {
        Self {
            current: DEFAULT_DIARY.to_string(),
            local: vec![LocalRecord {
                name: DEFAULT_DIARY.to_string(),
            }],
            remote: Vec::new(),
            defaults: None,
        }
    }

    pub fn kind_of(&self, name: &str) -> Option<DiaryKind> {
        if self.local.iter().any(|r| r.name == name) {
            Some(DiaryKind::Local)
        } else if self.remote.iter().any(|r| r.name == name) {
            Some(DiaryKind::Remote)
        } else {
            None
        }
    }

    pub fn remote(&self, name: &str) -> Option<&RemoteRecord> {
        self.remote.iter().find(|r| r.name == name)
    }

    /// Drop the record for `name`, whichever collection holds it.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.local.len() + self.remote.len();
        self.local.retain(|r| r.name != name);
        self.remote.retain(|r| r.name != name);
        before != self.local.len() + self.remote.len()
    }

    /// Check the registry invariants: names are unique across both
    /// collections, `config` is never a name, and `current` names a diary.
    pub fn validate(&self) -> ConfigResult<()> {
        let mut seen = HashSet::new();
        let names = self
            .local
            .iter()
            .map(|r| &r.name)
            .chain(self.remote.iter().map(|r| &r.name));
        for name in names {
            if name == CONFIG_NAME {
                return Err(ConfigError::Invalid(format!(
                    "\"{}\" cannot name a diary",
                    CONFIG_NAME
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "diary \"{}\" is registered twice",
                    name
                )));
            }
        }
        if self.kind_of(&self.current).is_none() {
            return Err(ConfigError::DanglingCurrent(self.current.clone()));
        }
        Ok(())
    }
}

/// Registry shared by a [`crate::Config`] and the diaries it hands out.
///
/// All reads and read-modify-write cycles go through one mutex so that
/// interleaved operations in a process never save a torn registry.
#[derive(Debug)]
pub struct Registry {
    basedir: PathBuf,
    state: Mutex<RegistryFile>,
}

impl Registry {
    pub fn new(basedir: PathBuf, file: RegistryFile) -> Self {
        Self {
            basedir,
            state: Mutex::new(file),
        }
    }

    pub fn file_path(basedir: &Path) -> PathBuf {
        basedir.join(CONFIG_NAME)
    }

    /// Read and validate the registry stored under `basedir`.
    ///
    /// Returns `Ok(None)` for an empty registry file.
    pub fn read(basedir: &Path) -> ConfigResult<Option<RegistryFile>> {
        let path = Self::file_path(basedir);
        if !path.is_file() {
            return Err(ConfigError::Uninitialized(basedir.to_path_buf()));
        }
        let contents = fs::read_to_string(&path)?;
        if contents.trim().is_empty() {
            return Ok(None);
        }
        let file: RegistryFile = toml::from_str(&contents)
            .map_err(|e| ConfigError::Invalid(format!("{}: {}", path.display(), e)))?;
        file.validate()?;
        Ok(Some(file))
    }

    /// Serialize `file` to the registry location.
    pub fn write(basedir: &Path, file: &RegistryFile) -> ConfigResult<()> {
        let contents = toml::to_string_pretty(file)
            .map_err(|e| ConfigError::Invalid(format!("TOML error: {}", e)))?;
        let path = Self::file_path(basedir);
        write_atomic(&path, contents.as_bytes())?;
        debug!(path = %path.display(), "registry saved");
        Ok(())
    }

    pub fn basedir(&self) -> &Path {
        &self.basedir
    }

    pub fn diary_dir(&self, name: &str) -> PathBuf {
        self.basedir.join(name)
    }

    pub fn entries_path(&self, name: &str) -> PathBuf {
        self.diary_dir(name).join(ENTRIES_FILE)
    }

    pub fn key_path(&self, name: &str) -> PathBuf {
        self.diary_dir(name).join(KEY_FILE)
    }

    fn lock(&self) -> ConfigResult<MutexGuard<'_, RegistryFile>> {
        self.state
            .lock()
            .map_err(|_| ConfigError::Invalid("registry lock poisoned".to_string()))
    }

    /// Copy of the current registry contents.
    pub fn snapshot(&self) -> ConfigResult<RegistryFile> {
        Ok(self.lock()?.clone())
    }

    pub fn kind_of(&self, name: &str) -> ConfigResult<Option<DiaryKind>> {
        Ok(self.lock()?.kind_of(name))
    }

    pub fn current(&self) -> ConfigResult<String> {
        Ok(self.lock()?.current.clone())
    }

    /// Apply `f` to a copy of the registry, validate and save the copy, and
    /// only then make it the live state. A failing `f`, validation or save
    /// leaves both memory and disk unchanged.
    pub fn update<T, F>(&self, f: F) -> ConfigResult<T>
    where
        F: FnOnce(&mut RegistryFile) -> ConfigResult<T>,
    {
        let mut guard = self.lock()?;
        let mut next = guard.clone();
        let value = f(&mut next)?;
        next.validate()?;
        Self::write(&self.basedir, &next)?;
        *guard = next;
        Ok(value)
    }

    /// Replace the live state without touching disk.
    pub fn reset(&self, file: RegistryFile) -> ConfigResult<()> {
        *self.lock()? = file;
        Ok(())
    }
}
