use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use blurg_core::VERSION;

/// Blurg - keep diaries on disk or on a diary server
#[derive(Parser)]
#[command(name = "blurg")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Base directory holding the registry and local diaries
    #[arg(short, long, global = true, env = "BLURG_HOME", value_name = "DIR")]
    pub basedir: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Server connection flags shared by remote commands
#[derive(Args, Debug, Clone, Default)]
pub struct ServerArgs {
    /// Diary server base URL
    #[arg(long, env = "BLURG_URL", value_name = "URL")]
    pub url: Option<String>,

    /// User the diary is registered under
    #[arg(long, env = "BLURG_USER", value_name = "USER")]
    pub user: Option<String>,
}

/// Arguments for the `add` command
#[derive(Args)]
pub struct AddArgs {
    /// Entry text
    #[arg(value_name = "TEXT", required = true, num_args = 1..)]
    pub text: Vec<String>,
}

/// Arguments for the `list` command
#[derive(Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `rm` command
#[derive(Args)]
pub struct RmArgs {
    /// Entry ID
    #[arg(value_name = "ID")]
    pub id: u64,
}

/// Arguments for commands that take a diary name
#[derive(Args)]
pub struct NameArgs {
    /// Diary name
    #[arg(value_name = "NAME")]
    pub name: String,
}

/// Arguments for the `promote` command
#[derive(Args)]
pub struct PromoteArgs {
    /// Local diary to move to the server
    #[arg(value_name = "NAME")]
    pub name: String,

    #[command(flatten)]
    pub server: ServerArgs,
}

/// Arguments for the `completions` command
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add an entry to the current diary
    Add(AddArgs),

    /// List entries of the current diary
    List(ListArgs),

    /// Remove an entry from the current diary
    Rm(RmArgs),

    /// List local and remote diaries
    Diaries,

    /// Switch the current diary
    Use(NameArgs),

    /// Create a local diary
    New(NameArgs),

    /// Delete a diary and all its entries
    Delete(NameArgs),

    /// Remote diary management
    Remote(RemoteArgs),

    /// Move a local diary to a diary server
    Promote(PromoteArgs),

    /// Move a remote diary back to local storage
    Demote(NameArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `remote` command group
#[derive(Args)]
pub struct RemoteArgs {
    #[command(subcommand)]
    pub command: RemoteSubcommand,
}

#[derive(Subcommand)]
pub enum RemoteSubcommand {
    /// Create a diary on a server
    Create(RemoteCreateArgs),

    /// Register a server diary using an existing key
    Attach(RemoteAttachArgs),

    /// Check the current diary's key with its server
    Verify,

    /// Show or set the default server and user
    Defaults(DefaultsArgs),
}

/// Arguments for `remote defaults`
#[derive(Args)]
pub struct DefaultsArgs {
    /// Default diary server base URL
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Default user
    #[arg(long, value_name = "USER")]
    pub user: Option<String>,

    /// Forget the stored defaults
    #[arg(long, conflicts_with_all = ["url", "user"])]
    pub clear: bool,
}

/// Arguments for `remote create`
#[derive(Args)]
pub struct RemoteCreateArgs {
    /// Diary name
    #[arg(value_name = "NAME")]
    pub name: String,

    #[command(flatten)]
    pub server: ServerArgs,
}

/// Arguments for `remote attach`
#[derive(Args)]
pub struct RemoteAttachArgs {
    /// Diary name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Key issued by the server
    #[arg(long, value_name = "KEY")]
    pub key: String,

    #[command(flatten)]
    pub server: ServerArgs,
}
