use crate::api::error::AppError;
use crate::services::converter::{self, DocumentMetadata};
use crate::services::export::{self, ConversionResult};
use crate::services::staging;
use crate::utils::validation::{
    sanitize_filename, validate_content, validate_extension,
};
use axum::{
    Json,
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;

/// Multipart request shape for the OpenAPI document
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ConvertRequest {
    /// The file to convert
    #[schema(value_type = String, format = Binary)]
    pub file: String,
}

#[derive(Serialize, ToSchema)]
pub struct ConvertResponse {
    pub filename: String,
    pub download_filename: String,
    pub size_bytes: usize,
    pub size_readable: String,
    pub markdown_chars: usize,
    pub preview: String,
    pub truncated: bool,
    pub remaining_chars: usize,
    pub document: String,
    pub metadata: DocumentMetadata,
    pub converted_at: chrono::DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct FormatsResponse {
    pub extensions: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub engine: String,
}

#[utoipa::path(
    post,
    path = "/api/convert",
    request_body(content = ConvertRequest, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Conversion succeeded", body = ConvertResponse),
        (status = 400, description = "No file or malformed upload"),
        (status = 413, description = "File too large"),
        (status = 415, description = "Extension outside the allow-list"),
        (status = 422, description = "Conversion failed")
    )
)]
pub async fn convert_file(
    State(state): State<crate::AppState>,
    multipart: Multipart,
) -> Result<Json<ConvertResponse>, AppError> {
    let result = run_pipeline(&state, multipart).await?;

    let body = &result.markdown;
    let markdown_chars = body.chars().count();
    let preview = export::preview(body, state.config.preview_chars);
    let preview_chars = preview.chars().count();

    Ok(Json(ConvertResponse {
        download_filename: export::download_filename(&result.source_filename),
        size_readable: export::format_file_size(result.size_bytes),
        markdown_chars,
        truncated: markdown_chars > preview_chars,
        remaining_chars: markdown_chars - preview_chars,
        document: export::document(&result),
        preview,
        filename: result.source_filename,
        size_bytes: result.size_bytes,
        metadata: result.metadata,
        converted_at: Utc::now(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/convert/file",
    request_body(content = ConvertRequest, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Markdown artifact as an attachment"),
        (status = 400, description = "No file or malformed upload"),
        (status = 413, description = "File too large"),
        (status = 415, description = "Extension outside the allow-list"),
        (status = 422, description = "Conversion failed")
    )
)]
pub async fn convert_download(
    State(state): State<crate::AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let result = run_pipeline(&state, multipart).await?;

    let filename = export::download_filename(&result.source_filename);
    let encoded = utf8_percent_encode(&filename, NON_ALPHANUMERIC);

    let headers = [
        (
            header::CONTENT_TYPE,
            "text/markdown; charset=utf-8".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename*=UTF-8''{}", encoded),
        ),
    ];

    Ok((headers, export::document(&result)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/formats",
    responses(
        (status = 200, description = "Configured extension allow-list", body = FormatsResponse)
    )
)]
pub async fn supported_formats(
    State(state): State<crate::AppState>,
) -> Json<FormatsResponse> {
    Json(FormatsResponse {
        extensions: state.config.allowed_extensions.iter().cloned().collect(),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health(State(state): State<crate::AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        engine: state.engine.name().to_string(),
    })
}

/// One full run: intake → staging → conversion. Presentation happens in the
/// calling handler. The staged file never survives this function, success or
/// failure.
async fn run_pipeline(
    state: &crate::AppState,
    mut multipart: Multipart,
) -> Result<ConversionResult, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name().unwrap_or_default() == "file" {
            let original_filename = field.file_name().unwrap_or("unnamed").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
            upload = Some((original_filename, data.to_vec()));
        }
    }

    let (original_filename, bytes) =
        upload.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    // 1. Sanitize filename
    let filename =
        sanitize_filename(&original_filename).map_err(|e| AppError::BadRequest(e.to_string()))?;

    // 2. Allow-list check, before anything touches disk
    let extension = validate_extension(&filename, &state.config)
        .map_err(|e| AppError::UnsupportedFormat(e.to_string()))?;

    // 3. Content screening (size bound, executable payloads)
    validate_content(&bytes, &extension, &state.config).map_err(|e| match e.code {
        "FILE_TOO_LARGE" => AppError::PayloadTooLarge(e.to_string()),
        _ => AppError::BadRequest(e.to_string()),
    })?;

    let run_id = Uuid::new_v4();
    let size_bytes = bytes.len();
    tracing::info!(
        %run_id,
        filename = %filename,
        extension = %extension,
        size_bytes,
        "starting conversion run"
    );

    // 4. Stage to a scoped temp file
    let staged = staging::stage(bytes, extension)
        .await
        .map_err(|e| AppError::Staging(e.to_string()))?;

    // 5. Convert; the staged file is consumed and removed on every outcome
    let conversion = converter::convert_staged(
        state.engine.clone(),
        staged,
        Duration::from_secs(state.config.conversion_timeout_secs),
    )
    .await
    .inspect_err(|e| tracing::warn!(%run_id, "conversion run failed: {}", e))?;

    tracing::info!(
        %run_id,
        markdown_chars = conversion.markdown.chars().count(),
        "conversion run finished"
    );

    Ok(ConversionResult {
        source_filename: filename,
        size_bytes,
        markdown: conversion.markdown,
        metadata: conversion.metadata,
    })
}
