use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

pub mod config;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mesh;
pub mod storage;

use config::Config;
use mesh::MeshConverter;
use storage::FileStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<FileStore>,
    pub converter: Arc<dyn MeshConverter>,
}

impl AppState {
    pub fn new(config: Config, converter: Arc<dyn MeshConverter>) -> Self {
        let store = FileStore::new(config.upload_dir.clone(), config.converted_dir.clone());
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
            converter,
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(http::handlers::health))
        .route(
            "/upload",
            post(http::handlers::upload).layer(upload_limit),
        )
        .route("/models/{filename}", get(http::handlers::get_model))
        .route(
            "/convert/{filename}/{target_format}",
            get(http::handlers::convert),
        )
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
