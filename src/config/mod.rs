use once_cell::sync::Lazy;
use std::collections::BTreeSet;
use std::env;

/// Default extension allow-list: documents, images, data files, zip archives.
pub static DEFAULT_EXTENSIONS: Lazy<BTreeSet<String>> = Lazy::new(|| {
    [
        "pdf", "docx", "pptx", "xlsx", "html", "htm", "txt", "md", "jpg", "jpeg", "png", "bmp",
        "gif", "csv", "json", "xml", "zip",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
});

/// Runtime configuration for the conversion pipeline
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Maximum upload size in bytes (default: 64 MB)
    pub max_file_size: usize,

    /// Preview length in characters (default: 1000)
    pub preview_chars: usize,

    /// Upper bound on a single conversion in seconds (default: 120)
    pub conversion_timeout_secs: u64,

    /// Extension allow-list, lowercased, without leading dots
    pub allowed_extensions: BTreeSet<String>,

    /// Engine type: "universal" or "noop" (default: "universal")
    pub engine_type: String,

    /// Optional OCR backend endpoint for image uploads
    pub ocr_endpoint: Option<String>,

    /// API key sent to the OCR backend
    pub ocr_api_key: Option<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            max_file_size: 64 * 1024 * 1024, // 64 MB
            preview_chars: 1000,
            conversion_timeout_secs: 120,
            allowed_extensions: DEFAULT_EXTENSIONS.clone(),
            engine_type: "universal".to_string(),
            ocr_endpoint: None,
            ocr_api_key: None,
        }
    }
}

impl ConverterConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            preview_chars: env::var("PREVIEW_CHARS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.preview_chars),

            conversion_timeout_secs: env::var("CONVERSION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.conversion_timeout_secs),

            allowed_extensions: env::var("ALLOWED_EXTENSIONS")
                .ok()
                .map(|v| {
                    v.split(',')
                        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                        .filter(|e| !e.is_empty())
                        .collect()
                })
                .unwrap_or(default.allowed_extensions),

            engine_type: env::var("ENGINE_TYPE").unwrap_or(default.engine_type),

            ocr_endpoint: env::var("OCR_ENDPOINT").ok().filter(|v| !v.is_empty()),

            ocr_api_key: env::var("OCR_API_KEY").ok().filter(|v| !v.is_empty()),
        }
    }

    /// Create config for development (small limits, short timeout, no OCR)
    pub fn development() -> Self {
        Self {
            max_file_size: 16 * 1024 * 1024,
            preview_chars: 1000,
            conversion_timeout_secs: 30,
            allowed_extensions: DEFAULT_EXTENSIONS.clone(),
            engine_type: "universal".to_string(),
            ocr_endpoint: None,
            ocr_api_key: None,
        }
    }

    /// Case-insensitive allow-list membership check
    pub fn is_extension_allowed(&self, extension: &str) -> bool {
        self.allowed_extensions.contains(&extension.to_lowercase())
    }
}
