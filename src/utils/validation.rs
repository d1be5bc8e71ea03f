use crate::config::ConverterConfig;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validates file size against the configured limit
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ValidationError> {
    if size > max_size {
        return Err(ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!(
                "File size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                max_size,
                max_size / 1024 / 1024
            ),
        });
    }
    Ok(())
}

/// Extracts the lowercased extension from a filename, if any
pub fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Sanitizes filename to prevent path traversal and injection attacks
/// Returns the sanitized filename or an error if the name is invalid
pub fn sanitize_filename(filename: &str) -> Result<String, ValidationError> {
    // Get only the filename component (remove any path)
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if name.is_empty() {
        return Err(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename cannot be empty".to_string(),
        });
    }

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path traversal attempt detected: {}", filename);
    }

    // Remove dangerous characters, keep only safe ones
    // We allow most Unicode characters but block path separators and reserved characters
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control()
                || c == '/'
                || c == '\\'
                || c == ':'
                || c == '*'
                || c == '?'
                || c == '"'
                || c == '<'
                || c == '>'
                || c == '|'
                || c == ';'
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    // Limit length safely for UTF-8
    let sanitized = if sanitized.len() > 255 {
        let mut end = 255;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    };

    // Prevent hidden files
    if sanitized.starts_with('.') {
        return Err(ValidationError {
            code: "HIDDEN_FILE",
            message: "Hidden files (starting with '.') are not allowed".to_string(),
        });
    }

    Ok(sanitized)
}

/// Checks the allow-list for the file's extension
pub fn validate_extension(
    filename: &str,
    config: &ConverterConfig,
) -> Result<String, ValidationError> {
    let extension = file_extension(filename).ok_or_else(|| ValidationError {
        code: "MISSING_EXTENSION",
        message: format!("File '{}' has no extension", filename),
    })?;

    if !config.is_extension_allowed(&extension) {
        return Err(ValidationError {
            code: "UNSUPPORTED_EXTENSION",
            message: format!(
                "File extension '.{}' is not supported. Supported: {}",
                extension,
                config
                    .allowed_extensions
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        });
    }

    Ok(extension)
}

/// Checks if file content appears to be executable
pub fn is_executable_content(header: &[u8]) -> bool {
    if header.len() < 4 {
        return false;
    }

    // ELF binary (Linux)
    if header.starts_with(&[0x7F, 0x45, 0x4C, 0x46]) {
        return true;
    }

    // PE/COFF (Windows .exe, .dll)
    if header.starts_with(&[0x4D, 0x5A]) {
        return true;
    }

    // Mach-O (macOS)
    if header.starts_with(&[0xFE, 0xED, 0xFA, 0xCE])
        || header.starts_with(&[0xFE, 0xED, 0xFA, 0xCF])
        || header.starts_with(&[0xCE, 0xFA, 0xED, 0xFE])
        || header.starts_with(&[0xCF, 0xFA, 0xED, 0xFE])
    {
        return true;
    }

    false
}

/// Screens uploaded bytes before staging: size bound, executable content,
/// and a sniff for containers masquerading under a mismatched extension.
pub fn validate_content(
    bytes: &[u8],
    extension: &str,
    config: &ConverterConfig,
) -> Result<(), ValidationError> {
    validate_file_size(bytes.len(), config.max_file_size)?;

    if is_executable_content(bytes) {
        return Err(ValidationError {
            code: "EXECUTABLE_CONTENT",
            message: "File contains executable content which is not allowed".to_string(),
        });
    }

    // infer only recognizes binary container formats; text formats pass through
    if let Some(kind) = infer::get(bytes) {
        if kind.matcher_type() == infer::MatcherType::App {
            return Err(ValidationError {
                code: "EXECUTABLE_CONTENT",
                message: format!(
                    "Content detected as '{}' is not allowed for extension '.{}'",
                    kind.mime_type(),
                    extension
                ),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_file_size() {
        let max = 1024 * 1024;
        assert!(validate_file_size(1024, max).is_ok());
        assert!(validate_file_size(max, max).is_ok());
        assert!(validate_file_size(max + 1, max).is_err());
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("test.PDF"), Some("pdf".to_string()));
        assert_eq!(file_extension("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(file_extension("noext"), None);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("test.pdf").unwrap(), "test.pdf");
        assert_eq!(sanitize_filename("my file.docx").unwrap(), "my file.docx");
        assert_eq!(
            sanitize_filename("test<script>.pdf").unwrap(),
            "test_script_.pdf"
        );
        assert_eq!(sanitize_filename("测试.txt").unwrap(), "测试.txt");

        // Path traversal
        assert_eq!(sanitize_filename("../../../etc/passwd").unwrap(), "passwd");
        assert_eq!(
            sanitize_filename("..\\..\\windows\\system32").unwrap(),
            "system32"
        );

        // Hidden files
        assert!(sanitize_filename(".htaccess").is_err());
        assert!(sanitize_filename("").is_err());
    }

    #[test]
    fn test_validate_extension() {
        let config = ConverterConfig::default();
        assert_eq!(validate_extension("report.pdf", &config).unwrap(), "pdf");
        assert_eq!(validate_extension("REPORT.PDF", &config).unwrap(), "pdf");

        let err = validate_extension("virus.exe", &config).unwrap_err();
        assert_eq!(err.code, "UNSUPPORTED_EXTENSION");

        let err = validate_extension("noext", &config).unwrap_err();
        assert_eq!(err.code, "MISSING_EXTENSION");
    }

    #[test]
    fn test_is_executable_content() {
        // ELF header
        assert!(is_executable_content(&[0x7F, 0x45, 0x4C, 0x46, 0x00]));
        // PE header
        assert!(is_executable_content(&[0x4D, 0x5A, 0x00, 0x00]));
        // Regular content
        assert!(!is_executable_content(b"Hello World"));
        assert!(!is_executable_content(&[0x89, 0x50, 0x4E, 0x47])); // PNG
    }

    #[test]
    fn test_validate_content() {
        let config = ConverterConfig::default();
        assert!(validate_content(b"Hello World", "txt", &config).is_ok());
        assert!(validate_content(&[0x4D, 0x5A, 0x00, 0x00], "txt", &config).is_err());
    }
}
