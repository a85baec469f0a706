use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use std::path::Path;

/// One published object as seen in the remote store. Never cached locally;
/// listings always reflect remote state at call time.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub size: i64,
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
}

/// Pass-through gateway to the object store. Single-attempt: retry policy,
/// if any, belongs to callers.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Uploads a local file's bytes under the given key, overwriting any
    /// existing object with the same key.
    async fn put_file(&self, key: &str, path: &Path) -> Result<()>;

    /// Lists objects whose keys end in `suffix` (case-sensitive, matching
    /// store semantics).
    async fn list_by_suffix(&self, suffix: &str) -> Result<Vec<StoredObject>>;

    /// Deletes a key unconditionally. A key that does not exist is success,
    /// matching at-least-once delete semantics.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Public-access URL for a key, per the store's naming convention.
    fn object_url(&self, key: &str) -> String;
}

pub struct S3StorageService {
    client: Client,
    bucket: String,
    region: String,
    endpoint_url: Option<String>,
}

impl S3StorageService {
    pub fn new(
        client: Client,
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> Self {
        Self {
            client,
            bucket,
            region,
            endpoint_url,
        }
    }
}

#[async_trait]
impl StorageService for S3StorageService {
    async fn put_file(&self, key: &str, path: &Path) -> Result<()> {
        let body = ByteStream::from_path(path).await?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type("application/octet-stream")
            .send()
            .await?;

        Ok(())
    }

    async fn list_by_suffix(&self, suffix: &str) -> Result<Vec<StoredObject>> {
        let mut objects = Vec::new();
        let mut continuation_token = None;

        loop {
            let res = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .set_continuation_token(continuation_token)
                .send()
                .await?;

            if let Some(contents) = res.contents {
                for object in contents {
                    let Some(key) = object.key else { continue };
                    if !key.ends_with(suffix) {
                        continue;
                    }
                    let last_modified = object.last_modified.and_then(|d| {
                        chrono::DateTime::from_timestamp(d.secs(), d.subsec_nanos())
                    });
                    objects.push(StoredObject {
                        key,
                        size: object.size.unwrap_or(0),
                        last_modified,
                    });
                }
            }

            if res.is_truncated.unwrap_or(false) {
                continuation_token = res.next_continuation_token;
            } else {
                break;
            }
        }

        Ok(objects)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        // S3 DeleteObject succeeds for keys that do not exist.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        match &self.endpoint_url {
            // Path-style for S3-compatible providers (MinIO etc.)
            Some(endpoint) => {
                format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key)
            }
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            ),
        }
    }
}
