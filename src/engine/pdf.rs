use crate::engine::error::EngineError;
use crate::services::converter::{Conversion, DocumentMetadata};
use lopdf::{Document, Object};

/// Extracts page text in page order plus Title/Author from the Info dictionary.
pub fn convert(bytes: &[u8]) -> Result<Conversion, EngineError> {
    let doc = Document::load_mem(bytes).map_err(|e| EngineError::Corrupt {
        format: "PDF",
        detail: e.to_string(),
    })?;

    if doc.is_encrypted() {
        return Err(EngineError::Encrypted);
    }

    let mut markdown = String::new();
    for (page_number, _object_id) in doc.get_pages() {
        match doc.extract_text(&[page_number]) {
            Ok(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    if !markdown.is_empty() {
                        markdown.push_str("\n\n");
                    }
                    markdown.push_str(trimmed);
                }
            }
            // pages without a text layer (scans) simply contribute nothing
            Err(e) => {
                tracing::debug!(page = page_number, "no text extracted: {}", e);
            }
        }
    }

    let metadata = DocumentMetadata {
        title: info_string(&doc, b"Title"),
        author: info_string(&doc, b"Author"),
    };

    Ok(Conversion { markdown, metadata })
}

fn info_string(doc: &Document, key: &[u8]) -> Option<String> {
    let info = doc.trailer.get(b"Info").ok()?;
    let dict = match info {
        Object::Reference(id) => doc.get_dictionary(*id).ok()?,
        Object::Dictionary(dict) => dict,
        _ => return None,
    };
    match dict.get(key).ok()? {
        Object::String(raw, _) => decode_pdf_string(raw),
        _ => None,
    }
}

// Info strings are either UTF-16BE with a BOM or (mostly ASCII) PDFDocEncoding
fn decode_pdf_string(raw: &[u8]) -> Option<String> {
    let text = if raw.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = raw[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        String::from_utf8_lossy(raw).into_owned()
    };
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
