mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

// ============================================================================
// CLI Types
// ============================================================================

/// Vmfleet - a small CLI for managing a simulated fleet of virtual machines
#[derive(Parser, Debug)]
#[command(version = vmfleet::build_info::VERSION, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = vmfleet::config::DEFAULT_CONFIG_FILE,
        global = true
    )]
    config: String,

    /// Instances document to operate on (overrides the config file)
    #[arg(long, global = true, value_name = "PATH")]
    data_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the interactive shell (the default)
    Shell,

    /// Print every machine in the collection
    List,

    /// Validate and append a new machine
    Add(commands::add::AddArgs),

    /// Edit an existing machine by id
    Edit(commands::edit::EditArgs),

    /// Delete a machine by id
    Delete {
        /// Id of the machine to delete
        id: String,
    },

    /// Print summary statistics for the collection
    Stats,

    /// Re-check every stored record against the schema
    Validate,

    /// Check whether a machine with the given name exists
    Check {
        /// Display name to look up
        name: String,
    },

    /// Initialize a new vmfleet workspace
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },
}

// ============================================================================
// Entry Point
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::process::ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config.as_str();
    let data_file = cli.data_file.as_deref();

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => commands::shell::run(config, data_file).await,
        Commands::List => commands::list::run(config, data_file).await,
        Commands::Add(args) => commands::add::run(config, data_file, args).await,
        Commands::Edit(args) => commands::edit::run(config, data_file, args).await,
        Commands::Delete { id } => commands::delete::run(config, data_file, &id).await,
        Commands::Stats => commands::stats::run(config, data_file).await,
        Commands::Validate => commands::validate::run(config, data_file).await,
        Commands::Check { name } => commands::check::run(config, data_file, &name).await,
        Commands::Init { path, force } => commands::init::run(&path, force).await,
    }
}

// ============================================================================
// Initialization
// ============================================================================

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
