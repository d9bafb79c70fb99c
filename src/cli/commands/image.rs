use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::{connect, OutputFormat};
use crate::config::AppConfig;
use crate::images::{self, catalog, Upload, Uploader};

#[derive(Subcommand)]
pub enum ImageCommands {
    #[command(about = "Import a file as a global, ownerless image")]
    Import {
        #[arg(help = "Path to the image file")]
        path: PathBuf,

        #[arg(long, help = "Catalog name (defaults to the file name)")]
        name: Option<String>,
    },
}

pub async fn handle(cmd: ImageCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ImageCommands::Import { path, name } => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let filename = path.file_name().map(|f| f.to_string_lossy().into_owned());

            let name = catalog::derive_name(name.as_deref(), filename.as_deref(), true, None)?;
            let normalized = images::normalize(bytes, config.images.clone()).await?;

            let store = connect(config).await?;
            let outcome = catalog::put(
                &store,
                Uploader { owner: None, admin: true },
                Upload {
                    name,
                    global: true,
                    game_id: None,
                    metadata: None,
                    image: normalized,
                },
            )
            .await?;

            let verb = if outcome.created { "Imported" } else { "Replaced" };
            output_success(
                &output_format,
                &format!("{} {}", verb, outcome.image.name),
                Some(json!({
                    "imageId": outcome.image.id,
                    "name": outcome.image.name,
                    "width": outcome.image.width,
                    "height": outcome.image.height,
                })),
            )
        }
    }
}
