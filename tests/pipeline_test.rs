mod common;

use common::{FailingStorage, InMemoryStorage, make_pipeline, staging_is_empty};
#[cfg(unix)]
use common::{failing_converter, silent_converter, stub_converter};
use map_tiles_backend::services::pipeline::{PipelineError, StagedUpload};
use std::sync::Arc;

#[cfg(unix)]
async fn stage_fixture(pipeline: &map_tiles_backend::services::pipeline::MapPipeline, name: &str, content: &[u8]) -> StagedUpload {
    let mut body = content;
    let (path, size) = pipeline.staging().stage(name, &mut body).await.unwrap();
    StagedUpload {
        original_name: name.to_string(),
        path,
        size,
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_convert_and_publish_success() {
    let tmp = tempfile::tempdir().unwrap();
    let converter = stub_converter(tmp.path());
    let staging_dir = tmp.path().join("staging");
    let storage = InMemoryStorage::new();
    let pipeline = make_pipeline(&staging_dir, converter.to_str().unwrap(), storage.clone());

    let upload = stage_fixture(&pipeline, "cities.geojson", b"{\"type\":\"FeatureCollection\"}").await;
    let artifact = pipeline.convert_and_publish(upload).await.unwrap();

    assert_eq!(artifact.key, "cities.pmtiles");
    assert_eq!(storage.keys(), vec!["cities.pmtiles"]);
    assert!(staging_is_empty(&staging_dir));
}

#[cfg(unix)]
#[tokio::test]
async fn test_conversion_failure_cleans_up_and_skips_publish() {
    let tmp = tempfile::tempdir().unwrap();
    let converter = failing_converter(tmp.path());
    let staging_dir = tmp.path().join("staging");
    let storage = InMemoryStorage::new();
    let pipeline = make_pipeline(&staging_dir, converter.to_str().unwrap(), storage.clone());

    let upload = stage_fixture(&pipeline, "broken.geojson", b"not geojson").await;
    let err = pipeline.convert_and_publish(upload).await.unwrap_err();

    match err {
        PipelineError::Conversion { diagnostics } => {
            assert!(diagnostics.contains("broken GeoJSON"));
        }
        other => panic!("expected Conversion error, got {:?}", other),
    }
    assert!(storage.keys().is_empty());
    assert!(staging_is_empty(&staging_dir));
}

#[cfg(unix)]
#[tokio::test]
async fn test_clean_exit_without_output_is_a_conversion_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let converter = silent_converter(tmp.path());
    let staging_dir = tmp.path().join("staging");
    let storage = InMemoryStorage::new();
    let pipeline = make_pipeline(&staging_dir, converter.to_str().unwrap(), storage.clone());

    let upload = stage_fixture(&pipeline, "cities.geojson", b"{}").await;
    let err = pipeline.convert_and_publish(upload).await.unwrap_err();

    assert!(matches!(err, PipelineError::Conversion { .. }));
    assert!(storage.keys().is_empty());
    assert!(staging_is_empty(&staging_dir));
}

#[cfg(unix)]
#[tokio::test]
async fn test_publish_failure_after_conversion_is_a_store_error() {
    let tmp = tempfile::tempdir().unwrap();
    let converter = stub_converter(tmp.path());
    let staging_dir = tmp.path().join("staging");
    let pipeline = make_pipeline(
        &staging_dir,
        converter.to_str().unwrap(),
        Arc::new(FailingStorage),
    );

    let upload = stage_fixture(&pipeline, "cities.geojson", b"{}").await;
    let err = pipeline.convert_and_publish(upload).await.unwrap_err();

    assert!(matches!(err, PipelineError::Store(_)));
    assert!(staging_is_empty(&staging_dir));
}

#[tokio::test]
async fn test_direct_publish_releases_staging_on_store_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let staging_dir = tmp.path().join("staging");
    let pipeline = make_pipeline(&staging_dir, "tippecanoe", Arc::new(FailingStorage));

    let mut body = &b"pmtiles bytes"[..];
    let (path, size) = pipeline.staging().stage("tiles.pmtiles", &mut body).await.unwrap();
    let upload = StagedUpload {
        original_name: "tiles.pmtiles".to_string(),
        path,
        size,
    };

    let err = pipeline.publish_direct(upload).await.unwrap_err();
    assert!(matches!(err, PipelineError::Store(_)));
    assert!(staging_is_empty(&staging_dir));
}

#[tokio::test]
async fn test_direct_publish_success() {
    let tmp = tempfile::tempdir().unwrap();
    let staging_dir = tmp.path().join("staging");
    let storage = InMemoryStorage::new();
    let pipeline = make_pipeline(&staging_dir, "tippecanoe", storage.clone());

    let mut body = &b"pmtiles bytes"[..];
    let (path, size) = pipeline.staging().stage("tiles.pmtiles", &mut body).await.unwrap();
    let upload = StagedUpload {
        original_name: "tiles.pmtiles".to_string(),
        path,
        size,
    };

    let artifact = pipeline.publish_direct(upload).await.unwrap();
    assert_eq!(artifact.key, "tiles.pmtiles");
    assert_eq!(
        storage.objects.lock().unwrap().get("tiles.pmtiles").unwrap(),
        b"pmtiles bytes"
    );
    assert!(staging_is_empty(&staging_dir));
}
