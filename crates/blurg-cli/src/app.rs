//! Application context for the Blurg CLI.

use anyhow::Context;
use blurg_core::Config;
use tracing::debug;

use crate::cli::Cli;
use crate::config::resolve_basedir;

/// Application context that bundles CLI args with the diary configuration
/// they point at.
pub struct AppContext<'a> {
    cli: &'a Cli,
}

impl<'a> AppContext<'a> {
    /// Create a new application context from CLI arguments.
    pub fn new(cli: &'a Cli) -> Self {
        Self { cli }
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// Open (creating on first use) the configuration under the resolved
    /// base directory.
    pub fn open_config(&self) -> anyhow::Result<Config> {
        let basedir = resolve_basedir(self.cli.basedir.as_deref())?;
        debug!(basedir = %basedir.display(), "opening configuration");
        Config::open(&basedir)
            .with_context(|| format!("Failed to open blurg configuration at {}", basedir.display()))
    }

    /// Print a confirmation line unless quiet.
    pub fn say(&self, message: impl AsRef<str>) {
        if !self.quiet() {
            println!("{}", message.as_ref());
        }
    }
}
