use thiserror::Error;

/// Failures raised by the conversion engine.
///
/// Every variant carries enough detail to show the user a single actionable
/// message; the adapter maps them onto the API error taxonomy in one place.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No backend handles this extension.
    #[error("No converter available for '.{extension}' files")]
    Unsupported { extension: String },

    /// The file could not be parsed by its format backend.
    #[error("File appears corrupt or is not a valid {format} file: {detail}")]
    Corrupt { format: &'static str, detail: String },

    /// PDF requires a password; text extraction is not possible.
    #[error("PDF is encrypted and cannot be converted")]
    Encrypted,

    /// OCR is configured but the backend did not answer.
    #[error("OCR backend unavailable: {detail}")]
    OcrUnavailable { detail: String },

    /// A member inside an uploaded archive could not be extracted.
    #[error("Failed to extract archive member '{name}': {detail}")]
    ArchiveMember { name: String, detail: String },

    /// Reading the staged file failed.
    #[error("I/O error while converting: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_cause() {
        let e = EngineError::Corrupt {
            format: "PDF",
            detail: "invalid xref table".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("PDF"));
        assert!(msg.contains("invalid xref table"));
    }

    #[test]
    fn test_archive_member_display() {
        let e = EngineError::ArchiveMember {
            name: "inner/report.docx".into(),
            detail: "bad CRC".into(),
        };
        assert!(e.to_string().contains("inner/report.docx"));
    }
}
