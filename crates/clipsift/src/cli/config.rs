//! The `clipsift config` command for configuration management.

use clap::{Args, Subcommand};
use clipsift_core::Config;
use std::path::Path;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,

    /// Show config file path
    Path,

    /// Initialize a new config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

const CONFIG_HEADER: &str = "\
# clipsift configuration
#
# [classify] holds the defaults for --labels and --min-probability (percent).
# Model files live in {general.model_dir}/{model.name}/.

";

/// Execute the config command.
pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = Config::load()?;
            println!("{}", config.to_toml()?);
        }

        ConfigCommand::Path => {
            let path = Config::default_path();
            println!("{}", path.display());
        }

        ConfigCommand::Init { force } => {
            let path = Config::default_path();
            write_default_config(&path, force)?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

/// Write the default configuration to `path`, creating parent directories.
fn write_default_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let toml = Config::default().to_toml()?;
    std::fs::write(path, format!("{CONFIG_HEADER}{toml}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        write_default_config(&path, false).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.model.name, Config::default().model.name);
        assert_eq!(loaded.classify.min_probability, 50.0);
    }

    #[test]
    fn test_init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[classify]\nmin_probability = 75.0\n").unwrap();

        let err = write_default_config(&path, false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(Config::load_from(&path).unwrap().classify.min_probability, 75.0);

        write_default_config(&path, true).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().classify.min_probability, 50.0);
    }
}
