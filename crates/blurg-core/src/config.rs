//! Process-wide diary configuration.
//!
//! [`Config`] owns the registry under a base directory, the current-diary
//! pointer, and the promote/demote migrations that move a diary between
//! local and remote storage.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use crate::api::RemoteClient;
use crate::diary::{Diary, EntryStore, LocalDiary, RemoteDiary};
use crate::error::{ConfigError, ConfigResult, DiaryError};
use crate::factory;
use crate::fs::{remove_dir_if_exists, remove_file_if_exists};
use crate::names::{CONFIG_NAME, DEFAULT_DIARY};
use crate::registry::{
    DiaryKind, LocalRecord, Registry, RegistryFile, RemoteDefaults, RemoteRecord, ENTRIES_FILE,
    KEY_FILE,
};
use crate::transport::{HttpTransport, Transport};

/// Which diary an operation applies to: a diary handle, a bare name, or
/// nothing (always a caller error).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiaryTarget<'a> {
    #[default]
    None,
    Diary { name: &'a str, kind: DiaryKind },
    Name(&'a str),
}

impl<'a> DiaryTarget<'a> {
    pub fn name(&self) -> Option<&'a str> {
        match *self {
            DiaryTarget::None => None,
            DiaryTarget::Diary { name, .. } | DiaryTarget::Name(name) => Some(name),
        }
    }

    fn require_name(&self) -> ConfigResult<&'a str> {
        self.name().ok_or(ConfigError::MissingTarget)
    }
}

impl<'a> From<&'a Diary> for DiaryTarget<'a> {
    fn from(diary: &'a Diary) -> Self {
        DiaryTarget::Diary {
            name: diary.name(),
            kind: diary.kind(),
        }
    }
}

impl<'a> From<&'a LocalDiary> for DiaryTarget<'a> {
    fn from(diary: &'a LocalDiary) -> Self {
        DiaryTarget::Diary {
            name: diary.name(),
            kind: DiaryKind::Local,
        }
    }
}

impl<'a> From<&'a RemoteDiary> for DiaryTarget<'a> {
    fn from(diary: &'a RemoteDiary) -> Self {
        DiaryTarget::Diary {
            name: diary.name(),
            kind: DiaryKind::Remote,
        }
    }
}

impl<'a> From<&'a str> for DiaryTarget<'a> {
    fn from(name: &'a str) -> Self {
        DiaryTarget::Name(name)
    }
}

impl<'a> From<&'a String> for DiaryTarget<'a> {
    fn from(name: &'a String) -> Self {
        DiaryTarget::Name(name.as_str())
    }
}

/// Diary registry rooted at a base directory.
pub struct Config {
    basedir: PathBuf,
    registry: Arc<Registry>,
    transport: Arc<dyn Transport>,
    migration: Mutex<()>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("basedir", &self.basedir)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load the registry under `basedir`, creating it (with a current local
    /// `default` diary) if there is none. Remote diaries use HTTP.
    pub fn open(basedir: impl Into<PathBuf>) -> ConfigResult<Self> {
        let transport = HttpTransport::new().map_err(DiaryError::from)?;
        Self::open_with_transport(basedir, Arc::new(transport))
    }

    /// Like [`Config::open`], sending remote requests through `transport`.
    pub fn open_with_transport(
        basedir: impl Into<PathBuf>,
        transport: Arc<dyn Transport>,
    ) -> ConfigResult<Self> {
        let basedir = basedir.into();
        fs::create_dir_all(&basedir)?;

        let file = match Registry::read(&basedir) {
            Ok(Some(file)) => file,
            Ok(None) | Err(ConfigError::Uninitialized(_)) => Self::bootstrap(&basedir)?,
            Err(err) => return Err(err),
        };

        Ok(Self {
            registry: Arc::new(Registry::new(basedir.clone(), file)),
            basedir,
            transport,
            migration: Mutex::new(()),
        })
    }

    fn bootstrap(basedir: &Path) -> ConfigResult<RegistryFile> {
        let file = RegistryFile::bootstrap();
        LocalDiary::create_storage(&basedir.join(DEFAULT_DIARY).join(ENTRIES_FILE))?;
        Registry::write(basedir, &file)?;
        info!(basedir = %basedir.display(), "initialized diary configuration");
        Ok(file)
    }

    pub fn basepath(&self) -> &Path {
        &self.basedir
    }

    pub(crate) fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub(crate) fn client(&self, base_url: &str) -> RemoteClient {
        RemoteClient::new(base_url, self.transport.clone())
    }

    fn lock_migration(&self) -> ConfigResult<MutexGuard<'_, ()>> {
        self.migration
            .lock()
            .map_err(|_| ConfigError::Invalid("migration lock poisoned".to_string()))
    }

    fn resolve(&self, name: &str) -> ConfigResult<Option<Diary>> {
        let snapshot = self.registry.snapshot()?;
        Ok(factory::resolve(name, &snapshot, self)?)
    }

    /// Name of the current diary.
    pub fn current_name(&self) -> ConfigResult<String> {
        self.registry.current()
    }

    /// The diary the current pointer names.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::DanglingCurrent` if the pointer names nothing.
    pub fn get_current_diary(&self) -> ConfigResult<Diary> {
        let current = self.registry.current()?;
        self.resolve(&current)?
            .ok_or(ConfigError::DanglingCurrent(current))
    }

    /// Point the current diary at a registered diary.
    pub fn set_current_diary<'a>(&self, target: impl Into<DiaryTarget<'a>>) -> ConfigResult<()> {
        let target = target.into();
        let name = target.require_name()?;
        if name == CONFIG_NAME {
            return Err(ConfigError::ReservedName(name.to_string()));
        }

        self.registry.update(|file| {
            match (file.kind_of(name), target) {
                (None, _) => return Err(ConfigError::UnknownDiary(name.to_string())),
                (Some(found), DiaryTarget::Diary { kind, .. }) if found != kind => {
                    return Err(ConfigError::UnknownDiary(name.to_string()))
                }
                _ => {}
            }
            file.current = name.to_string();
            Ok(())
        })?;
        info!(diary = name, "switched current diary");
        Ok(())
    }

    /// Whether the target is registered. A diary handle only matches a
    /// record of the same variant.
    pub fn has_diary<'a>(&self, target: impl Into<DiaryTarget<'a>>) -> ConfigResult<bool> {
        let target = target.into();
        let name = target.require_name()?;
        let found = self.registry.kind_of(name)?;
        Ok(match target {
            DiaryTarget::Diary { kind, .. } => found == Some(kind),
            _ => found.is_some(),
        })
    }

    /// Every registered diary as `(local, remote)`, each in insertion order.
    ///
    /// A remote record whose cached key cannot be read is left out of the
    /// listing and logged; opening it by name still reports the error.
    pub fn get_diaries(&self) -> ConfigResult<(Vec<LocalDiary>, Vec<RemoteDiary>)> {
        let snapshot = self.registry.snapshot()?;
        let local = snapshot
            .local
            .iter()
            .map(|record| LocalDiary::new(record.name.clone(), self.registry.clone()))
            .collect();
        let remote = snapshot
            .remote
            .iter()
            .filter_map(|record| {
                match RemoteDiary::load(record, self.client(&record.base_url), self.registry.clone())
                {
                    Ok(diary) => Some(diary),
                    Err(err) => {
                        warn!(diary = %record.name, error = %err, "skipping unreadable remote diary");
                        None
                    }
                }
            })
            .collect();
        Ok((local, remote))
    }

    /// Delete a diary's entries, storage and registry record.
    ///
    /// Deleting the current diary moves the pointer to `default`. A diary
    /// handle only deletes a record of the same variant.
    pub fn delete_diary<'a>(&self, target: impl Into<DiaryTarget<'a>>) -> ConfigResult<()> {
        let target = target.into();
        let name = target.require_name()?;
        if name == CONFIG_NAME {
            return Err(ConfigError::ReservedName(name.to_string()));
        }
        let diary = self
            .resolve(name)?
            .ok_or_else(|| ConfigError::UnknownDiary(name.to_string()))?;
        if let DiaryTarget::Diary { kind, .. } = target {
            if diary.kind() != kind {
                return Err(ConfigError::UnknownDiary(name.to_string()));
            }
        }
        diary.delete()?;
        Ok(())
    }

    /// Move a local diary to the server at `url`, owned by `user`.
    ///
    /// Entries are copied in order. Local storage is removed only after the
    /// copy succeeded and the registry records the diary as remote; a failed
    /// copy leaves the local diary untouched and wipes the half-made remote.
    pub fn promote_diary(&self, diaryname: &str, url: &str, user: &str) -> ConfigResult<RemoteDiary> {
        let _guard = self.lock_migration()?;
        if diaryname == CONFIG_NAME {
            return Err(ConfigError::ReservedName(diaryname.to_string()));
        }
        match self.registry.kind_of(diaryname)? {
            None => return Err(ConfigError::UnknownDiary(diaryname.to_string())),
            Some(DiaryKind::Remote) => {
                return Err(ConfigError::AlreadyRemote(diaryname.to_string()))
            }
            Some(DiaryKind::Local) => {}
        }

        let local = LocalDiary::new(diaryname, self.registry.clone());
        let entries = local.get_entries()?;

        let client = self.client(url);
        let key = client.init(diaryname, user)?;
        let remote = RemoteDiary::new(diaryname, user, key, client, self.registry.clone());

        let migrated = (|| -> ConfigResult<()> {
            for entry in &entries {
                remote.add_entry(&entry.text)?;
            }
            RemoteDiary::write_key(&self.registry.key_path(diaryname), remote.get_diarykey())?;
            self.registry.update(|file| {
                file.local.retain(|r| r.name != diaryname);
                file.remote.push(remote.record());
                Ok(())
            })
        })();
        if let Err(err) = migrated {
            if let Err(wipe_err) = remote.wipe() {
                warn!(diary = diaryname, error = %wipe_err, "could not wipe partially promoted diary");
            }
            if let Err(rm_err) = remove_file_if_exists(&self.registry.key_path(diaryname)) {
                warn!(diary = diaryname, error = %rm_err, "could not remove key of partially promoted diary");
            }
            return Err(err);
        }

        if let Err(err) = local.remove_storage() {
            warn!(diary = diaryname, error = %err, "could not remove local storage after promotion");
        }
        info!(diary = diaryname, url, entries = entries.len(), "promoted diary");
        Ok(remote)
    }

    /// Move a remote diary back to local storage and wipe it on the server.
    ///
    /// The local copy is written and the registry swapped before the server
    /// copy is wiped; a failure up to the swap removes the local copy and
    /// leaves the server untouched. A failed wipe is only logged.
    ///
    /// The current diary cannot be demoted.
    pub fn demote_diary(&self, diary_name: &str) -> ConfigResult<LocalDiary> {
        let _guard = self.lock_migration()?;
        if diary_name == CONFIG_NAME {
            return Err(ConfigError::ReservedName(diary_name.to_string()));
        }
        let snapshot = self.registry.snapshot()?;
        let record: RemoteRecord = match snapshot.kind_of(diary_name) {
            None => return Err(ConfigError::UnknownDiary(diary_name.to_string())),
            Some(_) if snapshot.current == diary_name => {
                return Err(ConfigError::DemoteCurrent(diary_name.to_string()))
            }
            Some(DiaryKind::Local) => return Err(ConfigError::NotRemote(diary_name.to_string())),
            Some(DiaryKind::Remote) => snapshot
                .remote(diary_name)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownDiary(diary_name.to_string()))?,
        };

        let remote = RemoteDiary::load(&record, self.client(&record.base_url), self.registry.clone())?;
        let entries = remote.get_entries()?;

        let local = LocalDiary::new(diary_name, self.registry.clone());
        let migrated = (|| -> ConfigResult<()> {
            local.remove_storage()?;
            LocalDiary::create_storage(local.path())?;
            for entry in &entries {
                local.insert_entry(&entry.text, entry.date)?;
            }
            self.registry.update(|file| {
                file.remote.retain(|r| r.name != diary_name);
                file.local.push(LocalRecord {
                    name: diary_name.to_string(),
                });
                Ok(())
            })
        })();
        if let Err(err) = migrated {
            if let Err(rm_err) = local.remove_storage() {
                warn!(diary = diary_name, error = %rm_err, "could not remove partially demoted storage");
            }
            return Err(err);
        }

        if let Err(err) = remote.wipe() {
            warn!(diary = diary_name, error = %err, "could not wipe demoted diary on its server");
        }
        if let Err(err) = remove_file_if_exists(&self.registry.key_path(diary_name)) {
            warn!(diary = diary_name, error = %err, "could not remove key file after demotion");
        }
        info!(diary = diary_name, entries = entries.len(), "demoted diary");
        Ok(local)
    }

    /// Whether a remote diary has the cached file `f_name` (its `key` file
    /// when `f_name` is `None`).
    ///
    /// Unknown names and local diaries looked up by name alone answer
    /// `false`.
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingTarget` if no diary or name is given
    /// - `ConfigError::LocalHasNoRemoteFiles` if `f_name` is asked of a local
    ///   diary
    pub fn has_remote_file<'a>(
        &self,
        target: impl Into<DiaryTarget<'a>>,
        f_name: Option<&str>,
    ) -> ConfigResult<bool> {
        let target = target.into();
        let name = target.require_name()?;
        let kind = match target {
            DiaryTarget::Diary { kind, .. } => Some(kind),
            _ => self.registry.kind_of(name)?,
        };

        match (kind, f_name) {
            (None, _) => Ok(false),
            (Some(DiaryKind::Local), Some(_)) => {
                Err(ConfigError::LocalHasNoRemoteFiles(name.to_string()))
            }
            (Some(DiaryKind::Local), None) => Ok(false),
            (Some(DiaryKind::Remote), f_name) => {
                let f_name = f_name.unwrap_or(KEY_FILE);
                if f_name.is_empty() || f_name.contains(['/', '\\']) || f_name.starts_with("..") {
                    return Err(ConfigError::Invalid(format!(
                        "\"{}\" is not a remote file name",
                        f_name
                    )));
                }
                Ok(self.registry.diary_dir(name).join(f_name).is_file())
            }
        }
    }

    /// Server and user stored for new remote diaries.
    pub fn remote_defaults(&self) -> ConfigResult<RemoteDefaults> {
        Ok(self.registry.snapshot()?.defaults.unwrap_or_default())
    }

    pub fn set_remote_defaults(&self, defaults: RemoteDefaults) -> ConfigResult<()> {
        self.registry.update(|file| {
            file.defaults = if defaults == RemoteDefaults::default() {
                None
            } else {
                Some(defaults)
            };
            Ok(())
        })
    }

    /// Fail unless a valid registry exists on disk at the base directory.
    pub fn check_invalid(&self) -> ConfigResult<()> {
        match Registry::read(&self.basedir)? {
            Some(_) => Ok(()),
            None => Err(ConfigError::Invalid("registry is empty".to_string())),
        }
    }

    /// Remove the registry and every local diary under the base directory.
    /// Remote diaries are left on their servers. Safe to call repeatedly.
    pub fn delete(&self) -> ConfigResult<()> {
        self.registry.reset(RegistryFile::bootstrap())?;
        remove_dir_if_exists(&self.basedir)?;
        info!(basedir = %self.basedir.display(), "deleted diary configuration");
        Ok(())
    }
}
