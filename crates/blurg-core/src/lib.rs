//! # Blurg Core
//!
//! Core library for Blurg - a diary manager that keeps named diaries either
//! on disk or on a remote diary server, and moves them between the two.
//!
//! This crate provides the registry, the diary backends and the remote API
//! client independent of the CLI interface.
//!
//! ## Architecture
//!
//! - **config**: Registry of diaries, current-diary pointer, promote/demote
//! - **factory**: Diary lookup and creation
//! - **diary**: Local (SQLite) and remote diaries behind [`EntryStore`]
//! - **api**: Remote diary API client
//! - **transport**: HTTP collaborator seam
//! - **server**: Embedded diary API server and loopback transport

pub mod api;
pub mod config;
pub mod diary;
pub mod entry;
pub mod error;
pub mod factory;
pub mod fs;
pub mod names;
pub mod registry;
pub mod server;
pub mod transport;

pub use api::{RemoteClient, Verification};
pub use config::{Config, DiaryTarget};
pub use diary::{Diary, EntryStore, LocalDiary, RemoteDiary};
pub use entry::Entry;
pub use error::{ConfigError, ConfigResult, DiaryError, DiaryResult, TransportError};
pub use factory::{create_local_diary, create_local_remote_diary, create_remote_diary, get_diary};
pub use registry::{DiaryKind, RemoteDefaults};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
