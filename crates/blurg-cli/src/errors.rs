//! CLI error types for structured error handling.
//!
//! This module provides typed errors that map to specific exit codes,
//! enabling consistent error handling across the CLI.

use std::fmt;

use blurg_core::{ConfigError, DiaryError};

use crate::constants::exit_codes;

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Resource not found (diary, entry)
    NotFound { message: String, hint: String },

    /// Invalid user input
    InvalidInput { message: String, hint: Option<String> },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint } => {
                write!(f, "{}\n{}", message, hint)
            }
            CliError::InvalidInput { message, hint } => {
                if let Some(h) = hint {
                    write!(f, "{}\n{}", message, h)
                } else {
                    write!(f, "{}", message)
                }
            }
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Create a NotFound error with message and hint.
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an InvalidInput error with message and hint.
    pub fn invalid_input_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::InvalidInput {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::InvalidInput { .. } => exit_codes::INVALID_INPUT,
        }
    }
}

/// Exit code for any error reaching `main`.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(cli) = err.downcast_ref::<CliError>() {
        return cli.exit_code();
    }
    let diary = err
        .downcast_ref::<DiaryError>()
        .or_else(|| match err.downcast_ref::<ConfigError>() {
            Some(ConfigError::Diary(inner)) => Some(inner),
            _ => None,
        });
    match diary {
        Some(DiaryError::NotFound(_) | DiaryError::EntryNotFound(_)) => {
            return exit_codes::NOT_FOUND
        }
        Some(
            DiaryError::ReservedName(_)
            | DiaryError::InvalidName { .. }
            | DiaryError::AlreadyExists(_)
            | DiaryError::EmptyEntry
            | DiaryError::EmptyKey,
        ) => return exit_codes::INVALID_INPUT,
        _ => {}
    }
    match err.downcast_ref::<ConfigError>() {
        Some(ConfigError::UnknownDiary(_)) => exit_codes::NOT_FOUND,
        Some(
            ConfigError::ReservedName(_)
            | ConfigError::AlreadyRemote(_)
            | ConfigError::NotRemote(_)
            | ConfigError::DemoteCurrent(_),
        ) => exit_codes::INVALID_INPUT,
        _ => exit_codes::FAILURE,
    }
}

/// Contextual hint for common core errors.
pub fn hint(err: &anyhow::Error) -> Option<&'static str> {
    let diary = match err.downcast_ref::<ConfigError>() {
        Some(ConfigError::UnknownDiary(_)) => {
            return Some("Hint: Run `blurg diaries` to see known diaries.")
        }
        Some(ConfigError::DemoteCurrent(_)) => {
            return Some("Hint: Switch to another diary first with `blurg use <NAME>`.")
        }
        Some(ConfigError::Diary(inner)) => Some(inner),
        Some(_) => return None,
        None => err.downcast_ref::<DiaryError>(),
    };
    match diary {
        Some(DiaryError::EntryNotFound(_)) => Some("Hint: Run `blurg list` to find entry IDs."),
        Some(DiaryError::Unreachable(_)) => {
            Some("Hint: Check the server URL (--url, BLURG_URL or `blurg remote defaults`).")
        }
        _ => None,
    }
}
