//! Blurg CLI - keep diaries on disk or on a diary server
//!
//! This is the command-line interface for Blurg. It provides a user-friendly
//! interface to the core library functionality.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod output;

use blurg_core::VERSION;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::AppContext;
use crate::cli::{Cli, Commands, RemoteSubcommand};
use crate::commands::{diaries, entries, misc, remote};

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let ctx = AppContext::new(&cli);

    if let Err(e) = run(&ctx, &cli) {
        eprintln!("Error: {:#}", e);
        if let Some(hint) = errors::hint(&e) {
            eprintln!("{}", hint);
        }
        std::process::exit(errors::exit_code(&e));
    }
}

/// Log to stderr, filtered by `BLURG_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_env("BLURG_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(ctx: &AppContext, cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::Add(args)) => {
            entries::handle_add(ctx, args)?;
        }
        Some(Commands::List(args)) => {
            entries::handle_list(ctx, args)?;
        }
        Some(Commands::Rm(args)) => {
            entries::handle_rm(ctx, args)?;
        }
        Some(Commands::Diaries) => {
            diaries::handle_diaries(ctx)?;
        }
        Some(Commands::Use(args)) => {
            diaries::handle_use(ctx, args)?;
        }
        Some(Commands::New(args)) => {
            diaries::handle_new(ctx, args)?;
        }
        Some(Commands::Delete(args)) => {
            diaries::handle_delete(ctx, args)?;
        }
        Some(Commands::Promote(args)) => {
            diaries::handle_promote(ctx, args)?;
        }
        Some(Commands::Demote(args)) => {
            diaries::handle_demote(ctx, args)?;
        }
        Some(Commands::Remote(args)) => match &args.command {
            RemoteSubcommand::Create(create_args) => {
                remote::handle_create(ctx, create_args)?;
            }
            RemoteSubcommand::Attach(attach_args) => {
                remote::handle_attach(ctx, attach_args)?;
            }
            RemoteSubcommand::Verify => {
                remote::handle_verify(ctx)?;
            }
            RemoteSubcommand::Defaults(defaults_args) => {
                remote::handle_defaults(ctx, defaults_args)?;
            }
        },
        Some(Commands::Completions(args)) => {
            misc::handle_completions(args)?;
        }
        None => {
            println!("Blurg v{}", VERSION);
            println!("\nQuickstart:");
            println!("  blurg add \"Hello\"");
            println!("  blurg list");
            println!("  blurg new travel && blurg use travel");
            println!("  blurg promote travel --url http://localhost:5000 --user me");
            println!("\nRun `blurg --help` for full usage.");
        }
    }

    Ok(())
}
