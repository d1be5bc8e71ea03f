pub mod archive;
pub mod error;
pub mod image;
pub mod markup;
pub mod office;
pub mod pdf;
pub mod tabular;

pub use error::EngineError;

use crate::config::ConverterConfig;
use crate::services::converter::{Conversion, ConversionEngine};
use self::image::OcrClient;
use std::path::Path;

/// The built-in conversion engine: dispatches on file extension to a format
/// backend. Holds only the optional OCR client, so one instance serves the
/// whole process and any number of concurrent conversions.
pub struct UniversalEngine {
    ocr: Option<OcrClient>,
}

impl UniversalEngine {
    pub fn new(config: &ConverterConfig) -> Self {
        let ocr = config
            .ocr_endpoint
            .clone()
            .map(|endpoint| OcrClient::new(endpoint, config.ocr_api_key.clone()));

        Self { ocr }
    }
}

impl ConversionEngine for UniversalEngine {
    fn convert(&self, path: &Path) -> Result<Conversion, EngineError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();

        let bytes = std::fs::read(path)?;

        convert_bytes(&bytes, &extension, self.ocr.as_ref())
    }

    fn name(&self) -> &'static str {
        "universal"
    }
}

/// Extension dispatch, shared by the path entry point and archive members.
pub(crate) fn convert_bytes(
    bytes: &[u8],
    extension: &str,
    ocr: Option<&OcrClient>,
) -> Result<Conversion, EngineError> {
    match extension {
        "pdf" => pdf::convert(bytes),
        "docx" => office::docx(bytes),
        "pptx" => office::pptx(bytes),
        "xlsx" => office::xlsx(bytes),
        "html" | "htm" => markup::html(bytes),
        "txt" | "md" => markup::plain(bytes),
        "xml" => markup::xml(bytes),
        "csv" => tabular::csv(bytes),
        "json" => tabular::json(bytes),
        "jpg" | "jpeg" | "png" | "bmp" | "gif" => image::convert(bytes, ocr),
        "zip" => archive::convert(bytes, ocr),
        other => Err(EngineError::Unsupported {
            extension: other.to_string(),
        }),
    }
}
