use crate::engine::error::EngineError;
use crate::services::converter::{Conversion, DocumentMetadata};
use std::io::Cursor;

/// CSV rendered as a markdown table, first record as the header row
pub fn csv(bytes: &[u8]) -> Result<Conversion, EngineError> {
    let cursor = Cursor::new(bytes);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(cursor);

    let mut markdown = String::new();

    let headers = rdr
        .headers()
        .map_err(|e| EngineError::Corrupt {
            format: "CSV",
            detail: e.to_string(),
        })?
        .clone();

    if !headers.is_empty() {
        let header_row = headers
            .iter()
            .map(|h| escape_cell(h))
            .collect::<Vec<_>>()
            .join(" | ");
        markdown.push_str(&format!("| {} |\n", header_row));

        let separator = headers.iter().map(|_| "---").collect::<Vec<_>>().join(" | ");
        markdown.push_str(&format!("| {} |\n", separator));
    }

    for record in rdr.records() {
        let record = record.map_err(|e| EngineError::Corrupt {
            format: "CSV",
            detail: e.to_string(),
        })?;
        let row = record
            .iter()
            .map(escape_cell)
            .collect::<Vec<_>>()
            .join(" | ");
        markdown.push_str(&format!("| {} |\n", row));
    }

    Ok(Conversion {
        markdown: markdown.trim_end().to_string(),
        metadata: DocumentMetadata::default(),
    })
}

fn escape_cell(cell: &str) -> String {
    cell.trim().replace('|', "\\|")
}

/// JSON pretty-printed inside a fenced block
pub fn json(bytes: &[u8]) -> Result<Conversion, EngineError> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Conversion {
            markdown: String::new(),
            metadata: DocumentMetadata::default(),
        });
    }

    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| EngineError::Corrupt {
            format: "JSON",
            detail: e.to_string(),
        })?;

    let pretty = serde_json::to_string_pretty(&value).map_err(|e| EngineError::Corrupt {
        format: "JSON",
        detail: e.to_string(),
    })?;

    Ok(Conversion {
        markdown: format!("```json\n{}\n```", pretty),
        metadata: DocumentMetadata::default(),
    })
}
