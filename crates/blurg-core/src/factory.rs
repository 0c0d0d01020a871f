//! Diary lookup and creation.
//!
//! Names are shared by the local and remote namespaces: a name can be
//! registered once, as either variant. Lookups never create remote diaries;
//! only [`create_remote_diary`] and [`create_local_remote_diary`] do.

use tracing::{info, warn};

use crate::config::Config;
use crate::diary::{Diary, EntryStore, LocalDiary, RemoteDiary};
use crate::error::{DiaryError, DiaryResult};
use crate::names::{validate_name, validate_remote_name};
use crate::registry::{DiaryKind, LocalRecord, RegistryFile};

/// Build the handle for `name` from a registry snapshot, if registered.
pub fn resolve(name: &str, file: &RegistryFile, config: &Config) -> DiaryResult<Option<Diary>> {
    let diary = match file.kind_of(name) {
        None => None,
        Some(DiaryKind::Local) => Some(Diary::Local(LocalDiary::new(
            name,
            config.registry().clone(),
        ))),
        Some(DiaryKind::Remote) => {
            let record = file
                .remote(name)
                .ok_or_else(|| DiaryError::NotFound(name.to_string()))?;
            Some(Diary::Remote(RemoteDiary::load(
                record,
                config.client(&record.base_url),
                config.registry().clone(),
            )?))
        }
    };
    Ok(diary)
}

/// Look up `name` in either namespace, creating a new local diary when it
/// is not registered.
pub fn get_diary(name: &str, config: &Config) -> DiaryResult<Diary> {
    validate_name(name)?;
    let snapshot = config.registry().snapshot()?;
    if let Some(diary) = resolve(name, &snapshot, config)? {
        return Ok(diary);
    }
    Ok(Diary::Local(create_local_diary(name, config)?))
}

/// Register a new, empty local diary.
pub fn create_local_diary(name: &str, config: &Config) -> DiaryResult<LocalDiary> {
    validate_name(name)?;
    let registry = config.registry();
    registry.update(|file| {
        if file.kind_of(name).is_some() {
            return Err(DiaryError::AlreadyExists(name.to_string()).into());
        }
        LocalDiary::create_storage(&registry.entries_path(name))?;
        file.local.push(LocalRecord {
            name: name.to_string(),
        });
        Ok(())
    })?;
    info!(diary = name, "created local diary");
    Ok(LocalDiary::new(name, registry.clone()))
}

/// Create a diary on the server at `base_url` and register it.
///
/// Reserved and duplicate names are rejected before any network call.
///
/// # Errors
///
/// - `DiaryError::ReservedName` for `default` and `config`
/// - `DiaryError::AlreadyExists` if either namespace holds `name`
/// - `DiaryError::Unreachable` / `DiaryError::Rejected` if the server cannot
///   issue a key
pub fn create_remote_diary(
    name: &str,
    config: &Config,
    base_url: &str,
    username: &str,
) -> DiaryResult<RemoteDiary> {
    validate_remote_name(name)?;
    ensure_unregistered(name, config)?;

    let client = config.client(base_url);
    let key = client.init(name, username)?;

    let diary = RemoteDiary::new(name, username, key, client, config.registry().clone());
    if let Err(err) = register_remote(&diary, config) {
        if let Err(wipe_err) = diary.wipe() {
            warn!(diary = name, error = %wipe_err, "could not wipe unregistered remote diary");
        }
        return Err(err);
    }
    info!(diary = name, base_url, "created remote diary");
    Ok(diary)
}

/// Register a remote diary whose key was issued out of band. No request is
/// made to the server.
pub fn create_local_remote_diary(
    name: &str,
    diary_key: &str,
    username: &str,
    config: &Config,
    base_url: &str,
) -> DiaryResult<RemoteDiary> {
    validate_remote_name(name)?;
    if diary_key.trim().is_empty() {
        return Err(DiaryError::EmptyKey);
    }
    ensure_unregistered(name, config)?;

    let diary = RemoteDiary::new(
        name,
        username,
        diary_key.trim(),
        config.client(base_url),
        config.registry().clone(),
    );
    register_remote(&diary, config)?;
    info!(diary = name, base_url, "attached remote diary");
    Ok(diary)
}

fn ensure_unregistered(name: &str, config: &Config) -> DiaryResult<()> {
    if config.registry().kind_of(name)?.is_some() {
        return Err(DiaryError::AlreadyExists(name.to_string()));
    }
    Ok(())
}

/// Cache the key and add the registry record under one registry lock.
fn register_remote(diary: &RemoteDiary, config: &Config) -> DiaryResult<()> {
    let registry = config.registry();
    let name = diary.name();
    registry.update(|file| {
        if file.kind_of(name).is_some() {
            return Err(DiaryError::AlreadyExists(name.to_string()).into());
        }
        RemoteDiary::write_key(&registry.key_path(name), diary.get_diarykey())?;
        file.remote.push(diary.record());
        Ok(())
    })?;
    Ok(())
}
