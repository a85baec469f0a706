use crate::config::AppConfig;
use crate::services::storage::S3StorageService;
use aws_sdk_s3::config::Region;
use std::sync::Arc;
use tracing::info;

/// Builds the process-wide S3 client from configuration. S3-compatible
/// providers (MinIO etc.) need an explicit endpoint and path-style addressing;
/// plain AWS resolves credentials and endpoint from the environment.
pub async fn setup_storage(config: &AppConfig) -> Arc<S3StorageService> {
    info!(
        "☁️  Object store: bucket={} region={} endpoint={}",
        config.bucket,
        config.region,
        config.endpoint_url.as_deref().unwrap_or("aws")
    );

    let mut loader = aws_config::from_env().region(Region::new(config.region.clone()));
    if let Some(endpoint) = &config.endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }
    let aws_config = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(config.endpoint_url.is_some())
        .build();

    let client = aws_sdk_s3::Client::from_conf(s3_config);

    Arc::new(S3StorageService::new(
        client,
        config.bucket.clone(),
        config.region.clone(),
        config.endpoint_url.clone(),
    ))
}
