//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use cloudvault_core::error::AppError;

use super::Cli;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the merged configuration
    Show,
    /// Validate the configuration files
    Validate,
}

/// Execute config commands
pub async fn execute(args: &ConfigArgs, cli: &Cli) -> Result<(), AppError> {
    let config = cli.load_config()?;
    let printer = cli.printer();
    let mut out = std::io::stdout().lock();

    match &args.command {
        ConfigCommand::Show => printer.settings(&mut out, &config)?,
        ConfigCommand::Validate => printer.confirm(
            &mut out,
            &format!("Configuration in '{}' ({}) is valid", cli.config_dir, cli.env),
            &[
                ("Server", config.server.bind_address()),
                ("Database", config.database.url.clone()),
                ("Blob root", config.storage.root_path.clone()),
                (
                    "Max upload",
                    format!("{} bytes", config.storage.max_upload_size_bytes),
                ),
            ],
        )?,
    }

    Ok(())
}
