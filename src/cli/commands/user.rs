use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::{connect, OutputFormat};
use crate::config::AppConfig;
use crate::database::UserStore;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Grant or revoke the admin flag")]
    Admin {
        #[arg(help = "Username")]
        username: String,

        #[arg(long, help = "Clear the flag instead of setting it")]
        revoke: bool,
    },
}

pub async fn handle(cmd: UserCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Admin { username, revoke } => {
            let store = connect(config).await?;
            let user = store
                .set_admin(&username, !revoke)
                .await?
                .ok_or_else(|| anyhow::anyhow!("User '{}' not found", username))?;

            let message = if user.admin {
                format!("{} is now an admin", user.username)
            } else {
                format!("{} is no longer an admin", user.username)
            };
            output_success(
                &output_format,
                &message,
                Some(json!({ "userId": user.id, "admin": user.admin })),
            )
        }
    }
}
