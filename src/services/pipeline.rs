use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::services::staging::StagingArea;
use crate::services::storage::StorageService;
use crate::services::tiler::{ConversionOutcome, TileConverter};
use crate::utils::format::tiled_key_for;

/// An upload that has been written to the staging area. Owned by exactly one
/// pipeline invocation, which removes it from staging before returning.
#[derive(Debug)]
pub struct StagedUpload {
    /// Sanitized client-supplied name. Drives the published key, never the
    /// staged path.
    pub original_name: String,
    pub path: PathBuf,
    pub size: u64,
}

/// The published result: the remote key and its public URL.
#[derive(Debug)]
pub struct PublishedArtifact {
    pub key: String,
    pub url: String,
}

/// Pipeline failures, categorized so callers can tell invalid data
/// (Conversion) from infrastructure problems (Store).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Conversion failed")]
    Conversion { diagnostics: String },

    #[error("Object store operation failed: {0}")]
    Store(#[source] anyhow::Error),

    #[error("Staging error: {0}")]
    Staging(#[source] anyhow::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Drives one upload through staging, optional conversion, and publication.
/// Every exit path funnels through a single release step, so no staged file
/// outlives its request.
pub struct MapPipeline {
    staging: StagingArea,
    converter: TileConverter,
    storage: Arc<dyn StorageService>,
}

impl MapPipeline {
    pub fn new(
        staging: StagingArea,
        converter: TileConverter,
        storage: Arc<dyn StorageService>,
    ) -> Self {
        Self {
            staging,
            converter,
            storage,
        }
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Publishes a file that is already in the tiled format under its
    /// original name. Staging is released whether or not the put succeeds.
    pub async fn publish_direct(
        &self,
        upload: StagedUpload,
    ) -> Result<PublishedArtifact, PipelineError> {
        let result = self.put(&upload.original_name, &upload).await;
        self.staging.release(&[upload.path]).await;
        result
    }

    /// Converts a staged source file and publishes the result under the key
    /// derived from the original name. Input and conversion output are both
    /// released regardless of where the pipeline exits.
    pub async fn convert_and_publish(
        &self,
        upload: StagedUpload,
    ) -> Result<PublishedArtifact, PipelineError> {
        let output_path = self.staging.reserve_output_path();
        let result = self.convert_then_put(&upload, &output_path).await;
        self.staging.release(&[upload.path, output_path]).await;
        result
    }

    async fn convert_then_put(
        &self,
        upload: &StagedUpload,
        output_path: &Path,
    ) -> Result<PublishedArtifact, PipelineError> {
        let outcome = self.converter.convert(&upload.path, output_path).await?;

        let output = match outcome {
            ConversionOutcome::Success { output } => output,
            ConversionOutcome::Failure { diagnostics } => {
                return Err(PipelineError::Conversion { diagnostics });
            }
        };

        // The tool exited cleanly, but publish only a fully produced file.
        let meta = tokio::fs::metadata(&output)
            .await
            .map_err(|_| PipelineError::Conversion {
                diagnostics: "Converter reported success but produced no output file".to_string(),
            })?;

        let key = tiled_key_for(&upload.original_name);
        let staged = StagedUpload {
            original_name: upload.original_name.clone(),
            path: output,
            size: meta.len(),
        };
        self.put(&key, &staged).await
    }

    async fn put(
        &self,
        key: &str,
        upload: &StagedUpload,
    ) -> Result<PublishedArtifact, PipelineError> {
        self.storage
            .put_file(key, &upload.path)
            .await
            .map_err(PipelineError::Store)?;

        info!(key = %key, size = upload.size, "Published tileset");

        Ok(PublishedArtifact {
            key: key.to_string(),
            url: self.storage.object_url(key),
        })
    }
}
