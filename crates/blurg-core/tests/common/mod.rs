#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use blurg_core::server::{DiaryServer, LoopbackTransport};
use blurg_core::Config;
use tempfile::TempDir;

pub const URL: &str = "http://localhost:5000";
pub const BAD_URL: &str = "http://localhost:5001";
pub const USER: &str = "TESTDIR";

/// A base directory wired to an in-process diary server at [`URL`].
pub struct Harness {
    pub dir: TempDir,
    pub server: Arc<DiaryServer>,
    pub config: Config,
}

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let server = Arc::new(DiaryServer::open_in_memory().expect("server should open"));
        let config = Self::open(&dir, &server);
        Self {
            dir,
            server,
            config,
        }
    }

    fn open(dir: &TempDir, server: &Arc<DiaryServer>) -> Config {
        let transport = Arc::new(LoopbackTransport::new(URL, server.clone()));
        Config::open_with_transport(dir.path().join(".blurg_test"), transport)
            .expect("config should open")
    }

    /// A second `Config` over the same base directory and server.
    pub fn reopen(&self) -> Config {
        Self::open(&self.dir, &self.server)
    }

    pub fn basedir(&self) -> PathBuf {
        self.dir.path().join(".blurg_test")
    }

    pub fn server_diaries(&self) -> usize {
        self.server.diary_count().expect("count should succeed")
    }
}
