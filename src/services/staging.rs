use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::io::AsyncRead;
use tracing::warn;
use uuid::Uuid;

use crate::utils::format::TILED_EXTENSION;

/// On-disk scratch space for one-request artifacts: staged uploads and
/// conversion output. Names are collision-free under concurrent requests;
/// nothing here survives past the request that created it.
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    /// Creates the staging directory if it does not exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create staging dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Unique staged name: millisecond timestamp + random component + the
    /// sanitized upload name, so staged files stay traceable to their origin.
    fn unique_name(suggested: &str) -> String {
        format!(
            "{}-{}-{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            suggested
        )
    }

    /// Writes the upload body to a uniquely named file and returns its path
    /// and byte count. Disk errors (full, permissions) and aborted upload
    /// streams are fatal for the request; a partially written file is removed
    /// before the error surfaces, so the error branch leaves no residue.
    pub async fn stage<R>(&self, suggested_name: &str, reader: &mut R) -> Result<(PathBuf, u64)>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let path = self.dir.join(Self::unique_name(suggested_name));

        let mut file = tokio::fs::File::create(&path)
            .await
            .with_context(|| format!("Failed to create staged file {}", path.display()))?;

        match tokio::io::copy(reader, &mut file).await {
            Ok(written) => Ok((path, written)),
            Err(e) => {
                drop(file);
                self.release(std::slice::from_ref(&path)).await;
                Err(e).with_context(|| format!("Failed to write staged file {}", path.display()))
            }
        }
    }

    /// Reserves a unique path for conversion output. The file is not created;
    /// the converter overwrites whatever the path holds.
    pub fn reserve_output_path(&self) -> PathBuf {
        self.dir.join(format!(
            "converted-{}-{}.{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            TILED_EXTENSION
        ))
    }

    /// Best-effort removal of staged paths. Missing files are skipped;
    /// removal failures are logged and never propagated, so cleanup cannot
    /// replace the primary result of a request.
    pub async fn release(&self, paths: &[PathBuf]) {
        for path in paths {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!("Failed to remove staged file {}: {}", path.display(), e);
                }
            }
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
