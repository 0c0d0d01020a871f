//! Constants used throughout the CLI.

/// Directory under `$HOME` used when neither `--basedir` nor `BLURG_HOME`
/// is set.
pub const DEFAULT_BASEDIR: &str = ".blurg";

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (also what clap exits with on bad usage)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// General failure.
    pub const FAILURE: i32 = 1;

    /// Invalid user input or arguments.
    pub const INVALID_INPUT: i32 = 2;

    /// Diary or entry not found.
    pub const NOT_FOUND: i32 = 3;
}
