use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use reconcile::Direction;
use remote::EntityKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "confsync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Sync configuration server entities with local folders", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Server base URL (overrides config)
    #[arg(long, env = "CONFSYNC_SERVER", global = true)]
    pub server: Option<String>,

    /// API token (overrides config)
    #[arg(long, env = "CONFSYNC_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Make a local folder match a remote entity
    Pull(SyncArgs),

    /// Make a remote entity match a local folder
    Push(SyncArgs),

    /// Show the differences between a local folder and a remote entity
    Diff(DiffArgs),

    /// Create an empty entity folder
    Init {
        /// Folder to create
        folder: PathBuf,
    },

    /// Show tracked folders and their last sync times
    Status,

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Sync
// ============================================================================

/// Entity address and local folder
#[derive(Args, Clone)]
pub struct Target {
    /// Entity kind
    #[arg(value_enum)]
    pub kind: KindArg,

    /// Entity id
    pub id: String,

    /// Local folder (default: <workspace root>/<kind>/<id>)
    pub folder: Option<PathBuf>,
}

#[derive(Args)]
pub struct SyncArgs {
    #[command(flatten)]
    pub target: Target,

    /// Show what would change without applying
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Apply without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct DiffArgs {
    #[command(flatten)]
    pub target: Target,

    /// Which side is the source
    #[arg(short, long, value_enum, default_value_t = DirectionArg::Push)]
    pub direction: DirectionArg,

    /// Print diff records as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Organizations,
    Hosts,
    Applications,
    Platforms,
    Distributions,
}

impl From<KindArg> for EntityKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Organizations => Self::Organizations,
            KindArg::Hosts => Self::Hosts,
            KindArg::Applications => Self::Applications,
            KindArg::Platforms => Self::Platforms,
            KindArg::Distributions => Self::Distributions,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DirectionArg {
    Push,
    Pull,
}

impl From<DirectionArg> for Direction {
    fn from(direction: DirectionArg) -> Self {
        match direction {
            DirectionArg::Push => Self::Push,
            DirectionArg::Pull => Self::Pull,
        }
    }
}

// ============================================================================
// Config Commands
// ============================================================================

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration and where it comes from
    Show,
}
