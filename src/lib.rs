pub mod api;
pub mod config;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::pipeline::MapPipeline;
use crate::services::storage::StorageService;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::maps::upload_map,
        api::handlers::maps::upload_geojson,
        api::handlers::maps::list_maps,
        api::handlers::maps::delete_map,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::maps::UploadResponse,
            api::handlers::maps::MapSummary,
            api::handlers::maps::MapListResponse,
            api::handlers::maps::DeleteResponse,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "maps", description = "Tileset upload, conversion and management"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageService>,
    pub pipeline: Arc<MapPipeline>,
    pub config: AppConfig,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/upload", post(api::handlers::maps::upload_map))
        .route("/upload-geojson", post(api::handlers::maps::upload_geojson))
        .route(
            "/maps",
            get(api::handlers::maps::list_maps),
        )
        .route(
            "/maps/:filename",
            axum::routing::delete(api::handlers::maps::delete_map),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(axum::extract::DefaultBodyLimit::max(
            state.config.max_upload_size + 10 * 1024 * 1024, // multipart overhead buffer
        ))
        .with_state(state)
}
