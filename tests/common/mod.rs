#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use map_tiles_backend::config::AppConfig;
use map_tiles_backend::services::pipeline::MapPipeline;
use map_tiles_backend::services::staging::StagingArea;
use map_tiles_backend::services::storage::{StorageService, StoredObject};
use map_tiles_backend::services::tiler::TileConverter;
use map_tiles_backend::{AppState, create_app};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::Arc;

/// In-memory store with S3 delete semantics (deleting a missing key is fine).
pub struct InMemoryStorage {
    pub objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            objects: Mutex::new(HashMap::new()),
        })
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn insert(&self, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
    }
}

#[async_trait]
impl StorageService for InMemoryStorage {
    async fn put_file(&self, key: &str, path: &Path) -> Result<()> {
        let data = tokio::fs::read(path).await?;
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn list_by_suffix(&self, suffix: &str) -> Result<Vec<StoredObject>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k.ends_with(suffix))
            .map(|(k, v)| StoredObject {
                key: k.clone(),
                size: v.len() as i64,
                last_modified: Some(Utc::now()),
            })
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        format!("https://maps.s3.us-east-1.amazonaws.com/{}", key)
    }
}

/// Store whose put always fails, for exercising the publish-failure path.
pub struct FailingStorage;

#[async_trait]
impl StorageService for FailingStorage {
    async fn put_file(&self, _key: &str, _path: &Path) -> Result<()> {
        Err(anyhow!("simulated network fault"))
    }

    async fn list_by_suffix(&self, _suffix: &str) -> Result<Vec<StoredObject>> {
        Ok(Vec::new())
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        format!("https://maps.s3.us-east-1.amazonaws.com/{}", key)
    }
}

pub fn make_pipeline(
    staging_dir: &Path,
    converter_path: &str,
    storage: Arc<dyn StorageService>,
) -> MapPipeline {
    MapPipeline::new(
        StagingArea::new(staging_dir).unwrap(),
        TileConverter::new(converter_path),
        storage,
    )
}

pub fn make_app(
    staging_dir: &Path,
    converter_path: &str,
    storage: Arc<dyn StorageService>,
) -> Router {
    let pipeline = Arc::new(make_pipeline(staging_dir, converter_path, storage.clone()));
    create_app(AppState {
        storage,
        pipeline,
        config: AppConfig::development(),
    })
}

/// Builds a multipart body carrying one `file` field.
pub fn multipart_body(boundary: &str, filename: &str, content: &str) -> String {
    format!(
        "--{boundary}\r\n\
        Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
        Content-Type: application/octet-stream\r\n\r\n\
        {content}\r\n\
        --{boundary}--\r\n"
    )
}

pub fn staging_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|entries| entries.count() == 0)
        .unwrap_or(true)
}

#[cfg(unix)]
fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Stand-in converter honoring the real argument order
/// (`-o OUT -zg --drop-densest-as-needed --force IN`): copies input to output.
#[cfg(unix)]
pub fn stub_converter(dir: &Path) -> PathBuf {
    write_script(dir, "fake-tippecanoe", "#!/bin/sh\ncp \"$6\" \"$2\"\n")
}

/// Converter that rejects every input the way tippecanoe does on malformed
/// GeoJSON: diagnostics on stderr, non-zero exit.
#[cfg(unix)]
pub fn failing_converter(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "fake-tippecanoe-fail",
        "#!/bin/sh\necho \"ERROR: broken GeoJSON at line 1\" >&2\nexit 1\n",
    )
}

/// Converter that exits 0 without writing any output file.
#[cfg(unix)]
pub fn silent_converter(dir: &Path) -> PathBuf {
    write_script(dir, "fake-tippecanoe-silent", "#!/bin/sh\nexit 0\n")
}
