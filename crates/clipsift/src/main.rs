//! Clipsift CLI - sort a folder of images by free-text labels with CLIP.
//!
//! Clipsift scores every image in a folder against a comma-separated list of
//! labels and keeps the ones whose best label clears a minimum probability.
//! Matches are printed as they are found.
//!
//! # Usage
//!
//! ```bash
//! # Classify a folder
//! clipsift classify ./photos --labels "cat, dog" --min-probability 90
//!
//! # Write an HTML gallery of the matches
//! clipsift classify ./photos --labels "cat, dog" --format html --output matches.html
//!
//! # Manage models
//! clipsift models download
//!
//! # Guided mode
//! clipsift
//! ```

use clap::{CommandFactory, Parser, Subcommand};

mod cli;
mod logging;

/// Clipsift - sort a folder of images by free-text labels with CLIP.
#[derive(Parser, Debug)]
#[command(name = "clipsift")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify the images in a folder against a set of labels
    Classify(cli::classify::ClassifyArgs),

    /// Manage the CLIP model files (download, list, etc.)
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match clipsift_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `clipsift config path`."
            );
            clipsift_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Clipsift v{}", clipsift_core::VERSION);

    match cli.command {
        Some(Commands::Classify(args)) => cli::classify::execute(args).await,
        Some(Commands::Models(args)) => cli::models::execute(args).await,
        Some(Commands::Config(args)) => cli::config::execute(args).await,
        None if is_interactive_terminal() => cli::interactive::run(&config).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

/// Guided mode needs a human on both ends of the terminal.
fn is_interactive_terminal() -> bool {
    console::Term::stdout().is_term() && console::Term::stderr().is_term()
}
