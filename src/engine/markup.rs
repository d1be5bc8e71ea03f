use crate::engine::error::EngineError;
use crate::services::converter::{Conversion, DocumentMetadata};
use quick_xml::Reader;
use quick_xml::events::Event;

/// HTML page converted to markdown
pub fn html(bytes: &[u8]) -> Result<Conversion, EngineError> {
    let content = String::from_utf8(bytes.to_vec()).map_err(|e| EngineError::Corrupt {
        format: "HTML",
        detail: format!("invalid UTF-8 encoding: {}", e),
    })?;

    let markdown = html2md::parse_html(&content);

    Ok(Conversion {
        markdown: markdown.trim().to_string(),
        metadata: DocumentMetadata {
            title: html_title(&content),
            author: None,
        },
    })
}

fn html_title(content: &str) -> Option<String> {
    let start = find_ignore_ascii_case(content, "<title>")? + "<title>".len();
    let end = find_ignore_ascii_case(&content[start..], "</title>")? + start;
    let title = content[start..end].trim();
    (!title.is_empty()).then(|| title.to_string())
}

// tag names are ASCII, so byte offsets stay valid in the original string
fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}

/// Plain text and markdown pass through as-is
pub fn plain(bytes: &[u8]) -> Result<Conversion, EngineError> {
    Ok(Conversion {
        markdown: String::from_utf8_lossy(bytes).into_owned(),
        metadata: DocumentMetadata::default(),
    })
}

/// XML data is checked for well-formedness, then presented verbatim in a
/// fenced block rather than flattened into lossy text.
pub fn xml(bytes: &[u8]) -> Result<Conversion, EngineError> {
    let content = String::from_utf8(bytes.to_vec()).map_err(|e| EngineError::Corrupt {
        format: "XML",
        detail: format!("invalid UTF-8 encoding: {}", e),
    })?;

    if content.trim().is_empty() {
        return Ok(Conversion {
            markdown: String::new(),
            metadata: DocumentMetadata::default(),
        });
    }

    let mut reader = Reader::from_str(&content);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(EngineError::Corrupt {
                    format: "XML",
                    detail: e.to_string(),
                });
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(Conversion {
        markdown: format!("```xml\n{}\n```", content.trim_end()),
        metadata: DocumentMetadata::default(),
    })
}
