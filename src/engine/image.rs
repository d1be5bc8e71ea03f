use crate::engine::error::EngineError;
use crate::services::converter::{Conversion, DocumentMetadata};
use base64::Engine as _;

/// Client for an optional remote OCR backend.
///
/// The backend receives the image as a base64 data URI and answers with
/// `{"text": "..."}`. Any transport or decode failure means the backend is
/// unavailable, which the engine surfaces rather than silently dropping OCR.
pub struct OcrClient {
    endpoint: String,
    api_key: Option<String>,
}

impl OcrClient {
    pub fn new(endpoint: String, api_key: Option<String>) -> Self {
        Self { endpoint, api_key }
    }

    pub fn extract_text(&self, bytes: &[u8], mime_type: &str) -> Result<String, EngineError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);

        let mut request = ureq::post(&self.endpoint).set("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            request = request.set("Authorization", &format!("Bearer {}", key));
        }

        let response = request
            .send_json(serde_json::json!({
                "image": format!("data:{};base64,{}", mime_type, encoded),
            }))
            .map_err(|e| EngineError::OcrUnavailable {
                detail: e.to_string(),
            })?;

        let body: serde_json::Value =
            response
                .into_json()
                .map_err(|e| EngineError::OcrUnavailable {
                    detail: format!("invalid OCR response: {}", e),
                })?;

        Ok(body
            .get("text")
            .and_then(|t| t.as_str())
            .unwrap_or_default()
            .trim()
            .to_string())
    }
}

/// Image converted to markdown: an embedded data URI plus basic properties,
/// and OCR text when a backend is configured.
pub fn convert(bytes: &[u8], ocr: Option<&OcrClient>) -> Result<Conversion, EngineError> {
    let mime_type = infer::get(bytes)
        .map(|k| k.mime_type())
        .unwrap_or("application/octet-stream");

    let img = image::load_from_memory(bytes).map_err(|e| EngineError::Corrupt {
        format: "image",
        detail: e.to_string(),
    })?;
    let (width, height) = (img.width(), img.height());

    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    let mut markdown = format!(
        "![image](data:{};base64,{})\n\n- Type: {}\n- Dimensions: {}x{} px\n",
        mime_type, encoded, mime_type, width, height
    );

    if let Some(client) = ocr {
        let text = client.extract_text(bytes, mime_type)?;
        if !text.is_empty() {
            markdown.push_str("\n## Extracted Text\n\n");
            markdown.push_str(&text);
            markdown.push('\n');
        }
    }

    Ok(Conversion {
        markdown: markdown.trim_end().to_string(),
        metadata: DocumentMetadata::default(),
    })
}
