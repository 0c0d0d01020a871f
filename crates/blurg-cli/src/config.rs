use std::path::PathBuf;

use blurg_core::RemoteDefaults;

use crate::cli::ServerArgs;
use crate::constants::DEFAULT_BASEDIR;
use crate::errors::CliError;

/// Base directory from `--basedir` / `BLURG_HOME`, else `$HOME/.blurg`.
pub fn resolve_basedir(flag: Option<&str>) -> anyhow::Result<PathBuf> {
    if let Some(value) = flag {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    Ok(home_dir()?.join(DEFAULT_BASEDIR))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}

/// Server URL and user for a remote command: flags (or their env vars)
/// first, then the stored defaults.
pub fn resolve_server(args: &ServerArgs, defaults: &RemoteDefaults) -> anyhow::Result<(String, String)> {
    let pick = |flag: &Option<String>, fallback: &Option<String>| {
        flag.as_deref()
            .or(fallback.as_deref())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
    };

    let url = pick(&args.url, &defaults.base_url).ok_or_else(|| {
        CliError::invalid_input_with_hint(
            "No diary server URL given",
            "Hint: Pass --url, set BLURG_URL, or run `blurg remote defaults --url <URL>`.",
        )
    })?;
    let user = pick(&args.user, &defaults.username).ok_or_else(|| {
        CliError::invalid_input_with_hint(
            "No user given",
            "Hint: Pass --user, set BLURG_USER, or run `blurg remote defaults --user <USER>`.",
        )
    })?;
    Ok((url, user))
}
