use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{error, info};

/// Outcome of one conversion run. Failure carries the tool's diagnostic
/// output verbatim so callers can surface it to the client.
#[derive(Debug)]
pub enum ConversionOutcome {
    Success { output: PathBuf },
    Failure { diagnostics: String },
}

/// Wraps the external tippecanoe tool as a subprocess. The option set is
/// fixed: automatic zoom selection, density thinning instead of hard failure
/// on dense inputs, and forced overwrite of the output path. Input content is
/// not pre-validated; the tool's own validation is authoritative.
pub struct TileConverter {
    binary: String,
}

impl TileConverter {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Runs the conversion and awaits subprocess exit. A non-zero exit code
    /// yields a failure outcome; only failure to run the binary at all is an
    /// error. No cleanup happens here: the caller owns both paths.
    pub async fn convert(&self, input: &Path, output: &Path) -> Result<ConversionOutcome> {
        info!(
            input = %input.display(),
            output = %output.display(),
            "Converting to PMTiles"
        );

        // -zg: guess zoom levels; --drop-densest-as-needed: thin instead of
        // failing on overly dense input; --force: overwrite the output path.
        let result = Command::new(&self.binary)
            .arg("-o")
            .arg(output)
            .arg("-zg")
            .arg("--drop-densest-as-needed")
            .arg("--force")
            .arg(input)
            .output()
            .await
            .with_context(|| format!("Failed to execute {}", self.binary))?;

        if !result.status.success() {
            let diagnostics = String::from_utf8_lossy(&result.stderr).to_string();
            error!(status = %result.status, "tippecanoe failed: {}", diagnostics.trim());
            return Ok(ConversionOutcome::Failure { diagnostics });
        }

        Ok(ConversionOutcome::Success {
            output: output.to_path_buf(),
        })
    }
}
