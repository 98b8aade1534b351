//! Directory tree inspection commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use cloudvault_core::error::AppError;

use super::Cli;

/// Arguments for tree commands
#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Tree subcommand
    #[command(subcommand)]
    pub command: TreeCommand,
}

/// Tree subcommands
#[derive(Debug, Subcommand)]
pub enum TreeCommand {
    /// Print a user's directory tree
    Show {
        /// Email of the owner
        email: String,
        /// Deepest level to print
        #[arg(short, long)]
        depth: Option<usize>,
    },
}

/// Tree display row
#[derive(Debug, Serialize, Tabled)]
struct TreeRow {
    /// Indented name
    name: String,
    /// Directory ID
    id: String,
    /// Files directly inside
    files: usize,
}

/// Execute tree commands
pub async fn execute(args: &TreeArgs, cli: &Cli) -> Result<(), AppError> {
    let config = cli.load_config()?;
    let services = super::open_services(&config).await?;

    match &args.command {
        TreeCommand::Show { email, depth } => {
            let owner = services.users.find_by_email(email).await?;
            let max_depth = depth.unwrap_or(config.tree.max_walk_depth);

            let rows: Vec<TreeRow> = services
                .tree
                .owner_tree(owner.id, max_depth)
                .await?
                .into_iter()
                .map(|entry| TreeRow {
                    name: format!("{}{}", "  ".repeat(entry.depth), entry.directory.name),
                    id: entry.directory.id.to_string(),
                    files: entry.file_count,
                })
                .collect();
            cli.printer()
                .rows(&mut std::io::stdout().lock(), &rows, "No directories yet.")?;
        }
    }

    Ok(())
}
