use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use rust_markdown_backend::config::ConverterConfig;
use rust_markdown_backend::engine::EngineError;
use rust_markdown_backend::services::converter::{self, Conversion, ConversionEngine, DocumentMetadata};
use rust_markdown_backend::{AppState, create_app};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::ServiceExt;

const BOUNDARY: &str = "---------------------------123456789012345678901234567";

/// Records whether the pipeline ever reached the engine
struct CountingEngine {
    calls: Arc<AtomicUsize>,
}

impl ConversionEngine for CountingEngine {
    fn convert(&self, _path: &Path) -> Result<Conversion, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Conversion {
            markdown: "converted".to_string(),
            metadata: DocumentMetadata::default(),
        })
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

fn multipart_body(filename: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn post(app: axum::Router, filename: &str, data: &[u8]) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/convert")
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_body(filename, data)))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

#[tokio::test]
async fn test_disallowed_extension_rejected_before_engine() {
    let calls = Arc::new(AtomicUsize::new(0));
    let state = AppState {
        engine: Arc::new(CountingEngine {
            calls: calls.clone(),
        }),
        config: ConverterConfig::development(),
    };

    let (status, json) = post(create_app(state), "payload.exe", b"harmless text").await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let message = json["error"].as_str().unwrap();
    assert!(message.contains(".exe"));
    // rejected at intake: the engine was never invoked
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_extension_rejected_before_engine() {
    let calls = Arc::new(AtomicUsize::new(0));
    let state = AppState {
        engine: Arc::new(CountingEngine {
            calls: calls.clone(),
        }),
        config: ConverterConfig::development(),
    };

    let (status, _) = post(create_app(state), "noextension", b"text").await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_executable_content_rejected_before_engine() {
    let calls = Arc::new(AtomicUsize::new(0));
    let state = AppState {
        engine: Arc::new(CountingEngine {
            calls: calls.clone(),
        }),
        config: ConverterConfig::development(),
    };

    // ELF magic under an allowed extension
    let (status, _) = post(create_app(state), "fake.txt", &[0x7F, 0x45, 0x4C, 0x46, 0x02]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_no_file_field_is_bad_request() {
    let state = AppState {
        engine: converter::create_engine(&ConverterConfig::development()),
        config: ConverterConfig::development(),
    };

    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"other\"\r\n\r\n\
         value\r\n\
         --{BOUNDARY}--\r\n"
    );

    let response = create_app(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/convert")
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "No file provided");
}

#[tokio::test]
async fn test_corrupt_pdf_surfaces_cause() {
    let config = ConverterConfig::development();
    let state = AppState {
        engine: converter::create_engine(&config),
        config,
    };

    let (status, json) = post(create_app(state), "broken.pdf", b"this is not a pdf at all").await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let message = json["error"].as_str().unwrap();
    assert!(!message.is_empty());
    assert!(message.contains("PDF"));
    // no artifact on the failure path
    assert!(json.get("document").is_none());
}

#[tokio::test]
async fn test_corrupt_docx_surfaces_cause() {
    let config = ConverterConfig::development();
    let state = AppState {
        engine: converter::create_engine(&config),
        config,
    };

    let (status, json) = post(create_app(state), "broken.docx", b"not an office file").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].as_str().unwrap().contains("DOCX"));
}

#[tokio::test]
async fn test_oversized_upload_rejected() {
    let mut config = ConverterConfig::development();
    config.max_file_size = 16;
    let state = AppState {
        engine: converter::create_engine(&config),
        config,
    };

    let (status, json) = post(
        create_app(state),
        "big.txt",
        b"this payload is larger than sixteen bytes",
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(json["error"].as_str().unwrap().contains("FILE_TOO_LARGE"));
}
