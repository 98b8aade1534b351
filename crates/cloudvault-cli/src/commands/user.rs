//! User management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use cloudvault_core::error::AppError;
use cloudvault_entity::user::User;

use super::Cli;

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// List all users
    List,
    /// Register a user so items can be shared with them
    Add {
        /// Email address
        email: String,
        /// Display name
        #[arg(short, long)]
        name: Option<String>,
        /// Grant administrator rights
        #[arg(long)]
        admin: bool,
    },
}

/// User display row for table output
#[derive(Debug, Serialize, Tabled)]
struct UserRow {
    /// User ID
    id: String,
    /// Email
    email: String,
    /// Display name
    name: String,
    /// Administrator
    admin: bool,
    /// Created at
    created_at: String,
}

impl From<User> for UserRow {
    fn from(u: User) -> Self {
        Self {
            id: u.id.to_string(),
            name: u.display_name.clone().unwrap_or_default(),
            email: u.email,
            admin: u.is_admin,
            created_at: u.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute user commands
pub async fn execute(args: &UserArgs, cli: &Cli) -> Result<(), AppError> {
    let config = cli.load_config()?;
    let services = super::open_services(&config).await?;
    let printer = cli.printer();
    let mut out = std::io::stdout().lock();

    match &args.command {
        UserCommand::List => {
            let rows: Vec<UserRow> = services
                .users
                .list_users()
                .await?
                .into_iter()
                .map(UserRow::from)
                .collect();
            printer.rows(&mut out, &rows, "No users registered.")?;
        }
        UserCommand::Add { email, name, admin } => {
            let user = services
                .users
                .create_user(email, name.clone(), *admin)
                .await?;
            printer.confirm(
                &mut out,
                &format!("User '{}' created", user.email),
                &[("User ID", user.id.to_string())],
            )?;
        }
    }

    Ok(())
}
