use crate::api::error::AppError;
use crate::services::pipeline::StagedUpload;
use crate::utils::format::{
    TILED_EXTENSION, is_convertible_name, is_tiled_name, sanitize_filename,
};
use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use chrono::Utc;
use futures::TryStreamExt;
use serde::Serialize;
use tokio_util::io::StreamReader;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub key: String,
    pub url: String,
}

#[derive(Serialize, ToSchema)]
pub struct MapSummary {
    pub filename: String,
    pub url: String,
    pub size: i64,
    pub last_modified: Option<chrono::DateTime<Utc>>,
}

#[derive(Serialize, ToSchema)]
pub struct MapListResponse {
    pub success: bool,
    pub data: Vec<MapSummary>,
}

#[derive(Serialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// Pulls the `file` field out of the multipart body and stages it. The name
/// check runs before any byte is written, so rejected uploads never touch
/// disk. A request with no `file` field is a client error.
async fn stage_from_multipart(
    state: &crate::AppState,
    mut multipart: Multipart,
    validate_name: impl Fn(&str) -> Result<(), AppError>,
) -> Result<StagedUpload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or("unnamed").to_string();
        let filename = sanitize_filename(&original_name)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        validate_name(&filename)?;

        let body_with_io_error =
            field.map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err));
        let mut reader = StreamReader::new(body_with_io_error);

        let (path, size) = state.pipeline.staging().stage(&filename, &mut reader).await?;

        return Ok(StagedUpload {
            original_name: filename,
            path,
            size,
        });
    }

    Err(AppError::BadRequest("No file uploaded".to_string()))
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = String, content_type = "multipart/form-data", description = "PMTiles file upload in a `file` field"),
    responses(
        (status = 200, description = "File uploaded successfully", body = UploadResponse),
        (status = 400, description = "No file or wrong extension"),
        (status = 502, description = "Object store failure")
    ),
    tag = "maps"
)]
pub async fn upload_map(
    State(state): State<crate::AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let upload = stage_from_multipart(&state, multipart, |name| {
        if is_tiled_name(name) {
            Ok(())
        } else {
            Err(AppError::BadRequest(format!(
                "Only .{} files are allowed",
                TILED_EXTENSION
            )))
        }
    })
    .await?;

    let artifact = state.pipeline.publish_direct(upload).await?;

    Ok(Json(UploadResponse {
        success: true,
        message: "File uploaded successfully".to_string(),
        key: artifact.key,
        url: artifact.url,
    }))
}

#[utoipa::path(
    post,
    path = "/upload-geojson",
    request_body(content = String, content_type = "multipart/form-data", description = "GeoJSON file to convert and publish, in a `file` field"),
    responses(
        (status = 200, description = "Converted and uploaded successfully", body = UploadResponse),
        (status = 400, description = "No file or unrecognized source format"),
        (status = 422, description = "Conversion tool rejected the input"),
        (status = 502, description = "Object store failure")
    ),
    tag = "maps"
)]
pub async fn upload_geojson(
    State(state): State<crate::AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let upload = stage_from_multipart(&state, multipart, |name| {
        if is_convertible_name(name) {
            Ok(())
        } else {
            Err(AppError::BadRequest(
                "Only .geojson or .json files can be converted".to_string(),
            ))
        }
    })
    .await?;

    let artifact = state.pipeline.convert_and_publish(upload).await?;

    Ok(Json(UploadResponse {
        success: true,
        message: "GeoJSON converted and uploaded successfully".to_string(),
        key: artifact.key,
        url: artifact.url,
    }))
}

#[utoipa::path(
    get,
    path = "/maps",
    responses(
        (status = 200, description = "Published tilesets", body = MapListResponse),
        (status = 502, description = "Object store failure")
    ),
    tag = "maps"
)]
pub async fn list_maps(
    State(state): State<crate::AppState>,
) -> Result<Json<MapListResponse>, AppError> {
    let suffix = format!(".{}", TILED_EXTENSION);
    let objects = state
        .storage
        .list_by_suffix(&suffix)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?;

    let data = objects
        .into_iter()
        .map(|o| MapSummary {
            url: state.storage.object_url(&o.key),
            filename: o.key,
            size: o.size,
            last_modified: o.last_modified,
        })
        .collect();

    Ok(Json(MapListResponse {
        success: true,
        data,
    }))
}

#[utoipa::path(
    delete,
    path = "/maps/{filename}",
    params(
        ("filename" = String, Path, description = "Published tileset key")
    ),
    responses(
        (status = 200, description = "Deleted (or already absent)", body = DeleteResponse),
        (status = 502, description = "Object store failure")
    ),
    tag = "maps"
)]
pub async fn delete_map(
    State(state): State<crate::AppState>,
    Path(filename): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    state
        .storage
        .delete(&filename)
        .await
        .map_err(|e| AppError::Store(e.to_string()))?;

    Ok(Json(DeleteResponse {
        success: true,
        message: format!("File {} deleted successfully", filename),
    }))
}
