use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use fusionsync_core::mapping::Section;
use fusionsync_core::ResourceId;

#[derive(Parser)]
#[command(name = "fusionsync")]
#[command(about = "Keep FusionAuth templates, themes and lambdas in sync with local files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// CLI profile name used to resolve the server host
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage email templates
    Email {
        #[command(subcommand)]
        command: EmailCommands,
    },
    /// Manage message templates
    Message {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Manage themes
    Theme {
        /// Theme parts to include, comma-separated or repeated (all when omitted)
        #[arg(
            short = 't',
            long = "types",
            global = true,
            value_enum,
            value_delimiter = ',',
            num_args = 1,
            action = ArgAction::Append
        )]
        types: Vec<ThemeType>,
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Manage lambdas
    Lambda {
        #[command(subcommand)]
        command: LambdaCommands,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

/// Server connection flags shared by every remote command.
#[derive(Args, Clone, Debug, Default)]
pub struct RemoteArgs {
    /// API key (falls back to FUSIONAUTH_API_KEY)
    #[arg(short = 'k', long, value_name = "KEY")]
    pub key: Option<String>,
    /// Server URL (falls back to FUSIONAUTH_HOST, then the profile)
    #[arg(short = 'H', long, value_name = "URL")]
    pub host: Option<String>,
}

#[derive(Subcommand)]
pub enum EmailCommands {
    #[command(flatten)]
    Template(TemplateCommands),
    /// Fill empty text bodies from their HTML bodies
    HtmlToText {
        /// Email template id (every id directory when omitted)
        id: Option<ResourceId>,
        /// Email template directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum TemplateCommands {
    /// Download one or every resource into a directory tree
    Download {
        /// Resource id (all when omitted)
        id: Option<ResourceId>,
        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
        /// Empty the target directory first
        #[arg(short, long)]
        clean: bool,
        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Upload one or every local resource
    Upload {
        /// Resource id (every id directory when omitted)
        id: Option<ResourceId>,
        /// Input directory
        #[arg(short, long, value_name = "DIR")]
        input: Option<PathBuf>,
        /// Replace existing resources instead of patching them
        #[arg(long)]
        overwrite: bool,
        /// Skip resources that do not exist on the server
        #[arg(long)]
        no_create: bool,
        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Patch resources as their files change
    Watch {
        /// Input directory
        #[arg(short, long, value_name = "DIR")]
        input: Option<PathBuf>,
        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Create an empty local resource under a new id
    Create {
        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
        /// Locale directories to create
        #[arg(short, long = "locale", value_name = "LOCALE", num_args = 1..)]
        locales: Vec<String>,
    },
    /// Copy a local resource under a new id
    Duplicate {
        /// Resource id to copy
        id: ResourceId,
        /// Resource directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum LambdaCommands {
    /// Create a lambda from <input>/<id>.yaml
    Create {
        id: ResourceId,
        /// Input directory
        #[arg(short, long, value_name = "DIR")]
        input: Option<PathBuf>,
        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Update a lambda from <input>/<id>.yaml
    Update {
        id: ResourceId,
        /// Input directory
        #[arg(short, long, value_name = "DIR")]
        input: Option<PathBuf>,
        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Print a lambda as YAML
    Retrieve {
        id: ResourceId,
        /// Also save it as <output>/<id>.yaml
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Use a lambda as the application's token populate lambda
    LinkToApplication {
        application_id: ResourceId,
        lambda_id: ResourceId,
        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Remove a lambda from the application's token populate lambdas
    UnlinkFromApplication {
        application_id: ResourceId,
        lambda_id: ResourceId,
        #[command(flatten)]
        remote: RemoteArgs,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update a profile
    Init {
        /// FusionAuth server URL
        #[arg(long, value_name = "URL")]
        host: Option<String>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ThemeType {
    Templates,
    Messages,
    Stylesheet,
}

impl From<ThemeType> for Section {
    fn from(value: ThemeType) -> Self {
        match value {
            ThemeType::Templates => Self::Templates,
            ThemeType::Messages => Self::Messages,
            ThemeType::Stylesheet => Self::Stylesheet,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
