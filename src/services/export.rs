use crate::services::converter::DocumentMetadata;
use std::path::Path;

/// Everything presentation needs from one finished run. Immutable; lives
/// only for the current response.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub source_filename: String,
    pub size_bytes: usize,
    pub markdown: String,
    pub metadata: DocumentMetadata,
}

/// Download name: original stem with the extension replaced by `.md`
pub fn download_filename(original: &str) -> String {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("converted");
    format!("{}.md", stem)
}

/// Convert bytes to human readable format, e.g. "1.5 MB"
pub fn format_file_size(size_bytes: usize) -> String {
    let mut size = size_bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} TB", size)
}

/// First `min(max_chars, len)` characters of the body, exact prefix.
/// Counted in characters, not bytes, so multi-byte text never splits.
pub fn preview(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// The download artifact: metadata header block followed by the raw body.
///
/// Must be a pure function of the result — no clock reads, no hidden state —
/// so repeated exports of the same result are byte-identical.
pub fn document(result: &ConversionResult) -> String {
    let mut out = String::new();
    out.push_str("# Converted Markdown Document\n");
    out.push_str("<!--\n");
    out.push_str(&format!("Original File: {}\n", result.source_filename));
    out.push_str(&format!(
        "Original Size: {} ({} bytes)\n",
        format_file_size(result.size_bytes),
        result.size_bytes
    ));
    out.push_str(&format!(
        "Converted Characters: {}\n",
        group_thousands(result.markdown.chars().count())
    ));
    if let Some(title) = &result.metadata.title {
        out.push_str(&format!("Title: {}\n", title));
    }
    if let Some(author) = &result.metadata.author {
        out.push_str(&format!("Author: {}\n", author));
    }
    out.push_str("Converter: rust-markdown-backend\n");
    out.push_str("-->\n\n");
    out.push_str(&result.markdown);
    out
}
