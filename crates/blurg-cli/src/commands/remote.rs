//! Remote diary commands.

use blurg_core::factory::{create_local_remote_diary, create_remote_diary};
use blurg_core::{EntryStore, RemoteDefaults, Verification};

use crate::app::AppContext;
use crate::cli::{DefaultsArgs, RemoteAttachArgs, RemoteCreateArgs};
use crate::config::resolve_server;
use crate::errors::CliError;

pub fn handle_create(ctx: &AppContext, args: &RemoteCreateArgs) -> anyhow::Result<()> {
    let config = ctx.open_config()?;
    let (url, user) = resolve_server(&args.server, &config.remote_defaults()?)?;
    let diary = create_remote_diary(&args.name, &config, &url, &user)?;
    ctx.say(format!("Created remote diary \"{}\" on {}", diary.name(), url));
    if !ctx.quiet() {
        println!("Key: {}", diary.get_diarykey());
    }
    Ok(())
}

pub fn handle_attach(ctx: &AppContext, args: &RemoteAttachArgs) -> anyhow::Result<()> {
    let config = ctx.open_config()?;
    let (url, user) = resolve_server(&args.server, &config.remote_defaults()?)?;
    let diary = create_local_remote_diary(&args.name, &args.key, &user, &config, &url)?;
    ctx.say(format!("Attached remote diary \"{}\" on {}", diary.name(), url));
    Ok(())
}

pub fn handle_verify(ctx: &AppContext) -> anyhow::Result<()> {
    let config = ctx.open_config()?;
    let current = config.get_current_diary()?;
    let Some(diary) = current.as_remote() else {
        return Err(CliError::not_found(
            format!("Current diary \"{}\" is local", current.name()),
            "Hint: Switch to a remote diary with `blurg use <NAME>`.",
        )
        .into());
    };

    match diary.verify()? {
        Verification::Valid { diaryname } => {
            ctx.say(format!("Key for \"{}\" is valid (server name \"{}\")", diary.name(), diaryname));
            Ok(())
        }
        Verification::Invalid => Err(anyhow::anyhow!(
            "Server {} does not recognize the key for \"{}\"",
            diary.base_url(),
            diary.name()
        )),
    }
}

pub fn handle_defaults(ctx: &AppContext, args: &DefaultsArgs) -> anyhow::Result<()> {
    let config = ctx.open_config()?;

    if args.clear {
        config.set_remote_defaults(RemoteDefaults::default())?;
        ctx.say("Cleared remote defaults");
        return Ok(());
    }

    let mut defaults = config.remote_defaults()?;
    if args.url.is_none() && args.user.is_none() {
        println!("url:  {}", defaults.base_url.as_deref().unwrap_or("-"));
        println!("user: {}", defaults.username.as_deref().unwrap_or("-"));
        return Ok(());
    }
    if let Some(url) = &args.url {
        defaults.base_url = Some(url.clone());
    }
    if let Some(user) = &args.user {
        defaults.username = Some(user.clone());
    }
    config.set_remote_defaults(defaults)?;
    ctx.say("Saved remote defaults");
    Ok(())
}
