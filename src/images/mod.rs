pub mod catalog;
pub mod pipeline;
pub mod svg;

pub use catalog::{CatalogError, PutOutcome, Upload, Uploader};
pub use pipeline::{ImageError, NormalizedImage, OutputFormat};

use crate::config::ImageConfig;

/// Runs [`pipeline::normalize`] off the async executor.
pub async fn normalize(bytes: Vec<u8>, config: ImageConfig) -> Result<NormalizedImage, ImageError> {
    tokio::task::spawn_blocking(move || pipeline::normalize(&bytes, &config))
        .await
        .map_err(|e| ImageError::Worker(e.to_string()))?
}
