//! `wds` - compile design-system presets.
//!
//! Usage:
//!   wds compile brand app     # write presets/{brand,app}.{css,conf.json,tokens.json}
//!   wds build                 # compile everything under systems/
//!   wds chain app             # show the resolved extends chain
//!   wds config app            # print the merged configuration
//!   wds generate request.yml  # compile one definition, print the artifact
//!   wds save promo promo.yml  # store a definition under systems/

mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use crate::settings::{Overrides, Settings};

#[derive(Parser, Debug)]
#[command(name = "wds")]
#[command(version, about = "Compile design-system presets into themes and stylesheets")]
struct Cli {
    /// Settings file (default: ./wds.yaml if present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory of preset sources
    #[arg(long, global = true, value_name = "DIR")]
    systems: Option<PathBuf>,

    /// Directory compiled artifacts are written to
    #[arg(long, global = true, value_name = "DIR")]
    output: Option<PathBuf>,

    /// External transformer command ({config} and {minify} are substituted)
    #[arg(long, global = true, value_name = "COMMAND")]
    command: Option<String>,

    /// Transformer timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command_kind: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile named presets and write their artifacts
    Compile {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Compile every preset in the systems directory
    Build,
    /// Print the resolved extends chain, base first
    Chain { name: String },
    /// Print the merged configuration of a preset
    Config { name: String },
    /// Compile a definition from FILE (or stdin) and print the artifact as JSON
    Generate { file: Option<PathBuf> },
    /// Store a definition from FILE (or stdin) in the systems directory
    Save { name: String, file: Option<PathBuf> },
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            systems: self.systems.clone(),
            output: self.output.clone(),
            command: self.command.clone(),
            timeout_secs: self.timeout,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let mut settings = Settings::load(cli.config.as_deref())?;
    settings.apply(cli.overrides());
    debug!(?settings, "loaded settings");

    match &cli.command_kind {
        Commands::Compile { names } => commands::compile(&settings, names).await,
        Commands::Build => commands::build(&settings).await,
        Commands::Chain { name } => commands::chain(&settings, name).await,
        Commands::Config { name } => commands::config(&settings, name).await,
        Commands::Generate { file } => commands::generate(&settings, file.as_deref()).await,
        Commands::Save { name, file } => commands::save(&settings, name, file.as_deref()).await,
    }
}
