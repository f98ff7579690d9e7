use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use regstore_types::{FileKey, PostId, RegistryKind};

#[derive(Parser)]
#[command(
    name = "regstore",
    about = "regstore — guarded post and file registries",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON state file (overrides `state_file` from the config)
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    /// Acting account, as a label or 64-char hex id
    #[arg(long, global = true)]
    pub caller: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new, empty state file
    Init(InitArgs),
    /// Manage posts
    Post(PostArgs),
    /// Manage files
    File(FileArgs),
    /// Show recent registry events
    Events(EventsArgs),
    /// Check store integrity and replay the event log
    Verify,
}

#[derive(Args)]
pub struct InitArgs {
    /// Administrator account (repeatable)
    #[arg(long = "admin", required = true)]
    pub admins: Vec<String>,
    /// Overwrite an existing state file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct PostArgs {
    #[command(subcommand)]
    pub action: PostAction,
}

#[derive(Subcommand)]
pub enum PostAction {
    Create {
        title: String,
        locator: String,
    },
    Update {
        id: PostId,
        title: String,
        locator: String,
    },
    Delete {
        id: PostId,
    },
    Get {
        id: PostId,
    },
    List(PageArgs),
    Count,
}

#[derive(Args)]
pub struct FileArgs {
    #[command(subcommand)]
    pub action: FileAction,
}

#[derive(Subcommand)]
pub enum FileAction {
    Create {
        path: String,
        locator: String,
        #[arg(long, default_value = "")]
        metadata: String,
    },
    Update {
        #[command(flatten)]
        target: FileTarget,
        locator: String,
        #[arg(long, default_value = "")]
        metadata: String,
    },
    Delete {
        #[command(flatten)]
        target: FileTarget,
    },
    /// Read one or more files; fails if any is missing
    Read {
        #[arg(long = "key")]
        keys: Vec<FileKey>,
        #[arg(long = "path")]
        paths: Vec<String>,
    },
    List {
        #[command(flatten)]
        page: PageArgs,
        /// Ignore paging and list every file
        #[arg(long)]
        all: bool,
    },
    /// List every key in enumeration order
    Keys {
        /// Only the key at this position
        #[arg(long)]
        index: Option<usize>,
    },
    /// Show the file at an enumeration position
    At {
        index: usize,
    },
    /// Print the key a path is stored under
    KeyOf {
        path: String,
    },
    Count,
}

/// Addresses one file, by key or by path.
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct FileTarget {
    #[arg(long)]
    pub key: Option<FileKey>,
    #[arg(long)]
    pub path: Option<String>,
}

#[derive(Args)]
pub struct PageArgs {
    #[arg(long, default_value = "0")]
    pub offset: usize,
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
}

#[derive(Args)]
pub struct EventsArgs {
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
    /// Only events from this registry
    #[arg(long)]
    pub registry: Option<RegistryArg>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum RegistryArg {
    Posts,
    Files,
}

impl From<RegistryArg> for RegistryKind {
    fn from(arg: RegistryArg) -> Self {
        match arg {
            RegistryArg::Posts => RegistryKind::Posts,
            RegistryArg::Files => RegistryKind::Files,
        }
    }
}
