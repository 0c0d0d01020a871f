//! Entry commands on the current diary.

use blurg_core::EntryStore;

use crate::app::AppContext;
use crate::cli::{AddArgs, ListArgs, RmArgs};
use crate::output::{entries_json, entries_table};

pub fn handle_add(ctx: &AppContext, args: &AddArgs) -> anyhow::Result<()> {
    let config = ctx.open_config()?;
    let diary = config.get_current_diary()?;
    let entry = diary.add_entry(&args.text.join(" "))?;
    ctx.say(format!("Added entry {} to \"{}\"", entry.id, diary.name()));
    Ok(())
}

pub fn handle_list(ctx: &AppContext, args: &ListArgs) -> anyhow::Result<()> {
    let config = ctx.open_config()?;
    let diary = config.get_current_diary()?;
    let entries = diary.get_entries()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries_json(&entries))?);
        return Ok(());
    }
    if entries.is_empty() {
        ctx.say(format!("No entries in \"{}\"", diary.name()));
        return Ok(());
    }
    println!("{}", entries_table(&entries));
    Ok(())
}

pub fn handle_rm(ctx: &AppContext, args: &RmArgs) -> anyhow::Result<()> {
    let config = ctx.open_config()?;
    let diary = config.get_current_diary()?;
    diary.remove_entry(args.id)?;
    ctx.say(format!("Removed entry {} from \"{}\"", args.id, diary.name()));
    Ok(())
}
