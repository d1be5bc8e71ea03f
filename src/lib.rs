pub mod api;
pub mod config;
pub mod engine;
pub mod handlers;
pub mod services;
pub mod utils;

use crate::config::ConverterConfig;
use crate::services::converter::ConversionEngine;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::convert::convert_file,
        handlers::convert::convert_download,
        handlers::convert::supported_formats,
        handlers::convert::health,
    ),
    components(
        schemas(
            handlers::convert::ConvertRequest,
            handlers::convert::ConvertResponse,
            handlers::convert::FormatsResponse,
            handlers::convert::HealthResponse,
            services::converter::DocumentMetadata,
        )
    ),
    tags(
        (name = "convert", description = "File to markdown conversion endpoints")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn ConversionEngine>,
    pub config: ConverterConfig,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(handlers::pages::index))
        .route("/health", get(handlers::convert::health))
        .route("/api/formats", get(handlers::convert::supported_formats))
        .route("/api/convert", post(handlers::convert::convert_file))
        .route("/api/convert/file", post(handlers::convert::convert_download))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
