use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::{connect, OutputFormat};
use crate::config::AppConfig;
use crate::database::RevocationLedger;

#[derive(Subcommand)]
pub enum TokensCommands {
    #[command(about = "Delete revoked tokens that have expired anyway")]
    Prune,
}

pub async fn handle(cmd: TokensCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokensCommands::Prune => {
            let store = connect(config).await?;
            let pruned = store.prune_expired(chrono::Utc::now()).await?;
            output_success(
                &output_format,
                &format!("Pruned {} expired revoked tokens", pruned),
                Some(json!({ "pruned": pruned })),
            )
        }
    }
}
