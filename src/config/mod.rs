use std::env;
use std::path::PathBuf;

/// Runtime configuration, loaded once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bucket that holds published tilesets
    pub bucket: String,

    /// AWS region (or region identifier for S3-compatible providers)
    pub region: String,

    /// Custom endpoint URL for S3-compatible providers (e.g. MinIO).
    /// When set, path-style addressing is used.
    pub endpoint_url: Option<String>,

    /// Directory holding staged uploads and conversion output (default: "uploads")
    pub staging_dir: PathBuf,

    /// Path to the tippecanoe binary (default: "tippecanoe", resolved via PATH)
    pub tippecanoe_path: String,

    /// Maximum upload size in bytes (default: 512 MB)
    pub max_upload_size: usize,

    /// Port to listen on (default: 3000)
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bucket: "maps".to_string(),
            region: "us-east-1".to_string(),
            endpoint_url: None,
            staging_dir: PathBuf::from("uploads"),
            tippecanoe_path: "tippecanoe".to_string(),
            max_upload_size: 512 * 1024 * 1024, // 512 MB
            port: 3000,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            bucket: env::var("AWS_BUCKET_NAME").unwrap_or(default.bucket),

            region: env::var("AWS_REGION").unwrap_or(default.region),

            endpoint_url: env::var("S3_ENDPOINT").ok().filter(|v| !v.is_empty()),

            staging_dir: env::var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.staging_dir),

            tippecanoe_path: env::var("TIPPECANOE_PATH").unwrap_or(default.tippecanoe_path),

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),
        }
    }

    /// Create config for development (local MinIO, small body limit)
    pub fn development() -> Self {
        Self {
            bucket: "maps-dev".to_string(),
            endpoint_url: Some("http://127.0.0.1:9000".to_string()),
            max_upload_size: 64 * 1024 * 1024,
            ..Self::default()
        }
    }
}
