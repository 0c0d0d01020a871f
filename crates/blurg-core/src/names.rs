//! Diary naming rules shared by the local and remote namespaces.

use crate::error::{DiaryError, DiaryResult};

/// Name of the diary created on first use.
pub const DEFAULT_DIARY: &str = "default";

/// Name of the registry file under the base directory; never a diary name.
pub const CONFIG_NAME: &str = "config";

/// Longest accepted diary name, in characters.
pub const MAX_NAME_LEN: usize = 64;

/// Validate a name for use as a diary identifier.
///
/// Each diary owns a directory named after it under the base directory, so
/// names must be single, non-hidden path components and must not shadow the
/// registry file.
pub fn validate_name(name: &str) -> DiaryResult<()> {
    if name == CONFIG_NAME {
        return Err(DiaryError::ReservedName(name.to_string()));
    }

    let invalid = |reason: &str| DiaryError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(invalid("name is too long"));
    }
    if name.starts_with('.') {
        return Err(invalid("name cannot start with '.'"));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(invalid("name cannot contain path separators"));
    }
    Ok(())
}

/// Validate a name for a new remote diary. `default` is reserved for the
/// local bootstrap diary.
pub fn validate_remote_name(name: &str) -> DiaryResult<()> {
    if name == DEFAULT_DIARY {
        return Err(DiaryError::ReservedName(name.to_string()));
    }
    validate_name(name)
}
