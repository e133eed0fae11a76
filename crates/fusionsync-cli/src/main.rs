//! fusionsync - keep FusionAuth configuration in a directory tree
//!
//! Downloads templates, themes and lambdas to files, pushes local edits back
//! and patches changed files while watching.

mod cli;
mod commands;
mod config_profiles;
mod error;
mod output;

use clap::Parser;
use colored::Colorize;
use fusionsync_core::mapping::Section;
use fusionsync_core::ResourceKind;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, EmailCommands};
use crate::commands::common::resource_dir;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::lambda::run_lambda;
use crate::commands::templates::{run_html_to_text, run_templates};
use crate::error::CliError;
use crate::output::error_details;

const DEFAULT_LOG_FILTER: &str = "fusionsync_core=warn";
const VERBOSE_LOG_FILTER: &str = "fusionsync_core=debug,fusionsync=debug";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("{}: {error}", "error".red().bold());
        if let Some(core) = error.core() {
            for line in error_details(core) {
                eprintln!("{}", line.render());
            }
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let profile = cli.profile.as_deref();

    match cli.command {
        Commands::Email {
            command: EmailCommands::Template(command),
        } => run_templates(ResourceKind::Email, &[], command, profile).await?,
        Commands::Email {
            command: EmailCommands::HtmlToText { id, output },
        } => {
            let root = resource_dir(output, ResourceKind::Email);
            run_html_to_text(&root, id.into()).await?;
        }
        Commands::Message { command } => {
            run_templates(ResourceKind::Message, &[], command, profile).await?;
        }
        Commands::Theme { types, command } => {
            let sections: Vec<Section> = types.into_iter().map(Section::from).collect();
            run_templates(ResourceKind::Theme, &sections, command, profile).await?;
        }
        Commands::Lambda { command } => run_lambda(command, profile).await?,
        Commands::Config { command } => run_config(command, profile)?,
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref())?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
