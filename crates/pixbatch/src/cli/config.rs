//! The `pixbatch config` command for configuration management.

use clap::{Args, Subcommand};
use pixbatch_core::Config;

use super::{expand_path, Context, Outcome};

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration
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

/// Execute the config command.
///
/// `--config` redirects `path` and `init` to the given file.
pub fn execute(ctx: &Context, args: ConfigArgs) -> anyhow::Result<Outcome> {
    let path = ctx
        .config_path
        .as_deref()
        .map(expand_path)
        .unwrap_or_else(Config::default_path);

    match args.command {
        ConfigCommand::Show => {
            let toml = ctx.config.to_toml()?;
            println!("{}", toml);
        }

        ConfigCommand::Path => {
            println!("{}", path.display());
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }

            // Ensure parent directory exists
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let toml = Config::default().to_toml()?;
            std::fs::write(&path, toml)?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(Outcome::Clean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_respects_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let ctx = Context::new(Config::default(), false, true, Some(path.clone()));
        let init = |force| ConfigArgs {
            command: ConfigCommand::Init { force },
        };

        execute(&ctx, init(false)).unwrap();
        assert!(Config::load_from(&path).is_ok());

        assert!(execute(&ctx, init(false)).is_err());
        assert!(execute(&ctx, init(true)).is_ok());
    }
}
