//! Diary registry commands.

use blurg_core::factory::create_local_diary;
use blurg_core::EntryStore;

use crate::app::AppContext;
use crate::cli::{NameArgs, PromoteArgs};
use crate::config::resolve_server;
use crate::output::diaries_table;

pub fn handle_diaries(ctx: &AppContext) -> anyhow::Result<()> {
    let config = ctx.open_config()?;
    let current = config.current_name()?;
    let (local, remote) = config.get_diaries()?;
    println!("{}", diaries_table(&current, &local, &remote));
    Ok(())
}

pub fn handle_use(ctx: &AppContext, args: &NameArgs) -> anyhow::Result<()> {
    let config = ctx.open_config()?;
    config.set_current_diary(args.name.as_str())?;
    ctx.say(format!("Now using \"{}\"", args.name));
    Ok(())
}

pub fn handle_new(ctx: &AppContext, args: &NameArgs) -> anyhow::Result<()> {
    let config = ctx.open_config()?;
    let diary = create_local_diary(&args.name, &config)?;
    ctx.say(format!("Created local diary \"{}\"", diary.name()));
    Ok(())
}

pub fn handle_delete(ctx: &AppContext, args: &NameArgs) -> anyhow::Result<()> {
    let config = ctx.open_config()?;
    config.delete_diary(args.name.as_str())?;
    ctx.say(format!("Deleted \"{}\"", args.name));
    Ok(())
}

pub fn handle_promote(ctx: &AppContext, args: &PromoteArgs) -> anyhow::Result<()> {
    let config = ctx.open_config()?;
    let (url, user) = resolve_server(&args.server, &config.remote_defaults()?)?;
    let diary = config.promote_diary(&args.name, &url, &user)?;
    ctx.say(format!("Promoted \"{}\" to {}", diary.name(), diary.base_url()));
    Ok(())
}

pub fn handle_demote(ctx: &AppContext, args: &NameArgs) -> anyhow::Result<()> {
    let config = ctx.open_config()?;
    let diary = config.demote_diary(&args.name)?;
    ctx.say(format!("Demoted \"{}\" to local storage", diary.name()));
    Ok(())
}
