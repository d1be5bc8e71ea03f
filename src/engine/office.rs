use crate::engine::error::EngineError;
use crate::services::converter::{Conversion, DocumentMetadata};
use calamine::Reader as SpreadsheetReader;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Word document: paragraph text from word/document.xml
pub fn docx(bytes: &[u8]) -> Result<Conversion, EngineError> {
    let mut archive = open_container(bytes, "DOCX")?;
    let document_xml = read_member(&mut archive, "word/document.xml").ok_or_else(|| {
        EngineError::Corrupt {
            format: "DOCX",
            detail: "missing word/document.xml".to_string(),
        }
    })?;

    let markdown = extract_paragraphs(&document_xml, b"w:p", b"w:t", "DOCX")?;
    let metadata = core_properties(&mut archive);

    Ok(Conversion { markdown, metadata })
}

/// PowerPoint deck: one section per slide, in slide order
pub fn pptx(bytes: &[u8]) -> Result<Conversion, EngineError> {
    let mut archive = open_container(bytes, "PPTX")?;

    let mut slide_names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
        .map(|n| n.to_string())
        .collect();
    slide_names.sort_by_key(|n| slide_number(n));

    let mut markdown = String::new();
    for (index, name) in slide_names.iter().enumerate() {
        let xml = read_member(&mut archive, name).ok_or_else(|| EngineError::Corrupt {
            format: "PPTX",
            detail: format!("unreadable slide '{}'", name),
        })?;
        let text = extract_paragraphs(&xml, b"a:p", b"a:t", "PPTX")?;

        markdown.push_str(&format!("## Slide {}\n\n", index + 1));
        if !text.trim().is_empty() {
            markdown.push_str(text.trim_end());
            markdown.push_str("\n\n");
        }
    }

    let metadata = core_properties(&mut archive);

    Ok(Conversion {
        markdown: markdown.trim_end().to_string(),
        metadata,
    })
}

/// Excel workbook: every sheet rendered as a markdown table
pub fn xlsx(bytes: &[u8]) -> Result<Conversion, EngineError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook: calamine::Xlsx<_> =
        calamine::open_workbook_from_rs(cursor).map_err(|e: calamine::XlsxError| EngineError::Corrupt {
            format: "XLSX",
            detail: e.to_string(),
        })?;

    let sheet_names = workbook.sheet_names().to_vec();
    let multiple = sheet_names.len() > 1;
    let mut markdown = String::new();

    for name in sheet_names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| EngineError::Corrupt {
                format: "XLSX",
                detail: format!("sheet '{}': {}", name, e),
            })?;

        if multiple {
            markdown.push_str(&format!("## {}\n\n", name));
        }
        markdown.push_str(&render_table(&range));
        markdown.push('\n');
    }

    // workbook metadata lives in the same OOXML core.xml as docx/pptx
    let metadata = open_container(bytes, "XLSX")
        .map(|mut archive| core_properties(&mut archive))
        .unwrap_or_default();

    Ok(Conversion {
        markdown: markdown.trim_end().to_string(),
        metadata,
    })
}

fn open_container(
    bytes: &[u8],
    format: &'static str,
) -> Result<ZipArchive<Cursor<Vec<u8>>>, EngineError> {
    ZipArchive::new(Cursor::new(bytes.to_vec())).map_err(|e| EngineError::Corrupt {
        format,
        detail: e.to_string(),
    })
}

fn read_member(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> Option<String> {
    let mut member = archive.by_name(name).ok()?;
    let mut content = String::new();
    member.read_to_string(&mut content).ok()?;
    Some(content)
}

fn slide_number(name: &str) -> u32 {
    name.trim_start_matches("ppt/slides/slide")
        .trim_end_matches(".xml")
        .parse()
        .unwrap_or(u32::MAX)
}

/// Walks the OOXML body, collecting text runs and emitting a blank line per
/// paragraph close. Works for both WordprocessingML and DrawingML payloads.
fn extract_paragraphs(
    xml: &str,
    paragraph_tag: &[u8],
    text_tag: &[u8],
    format: &'static str,
) -> Result<String, EngineError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == text_tag => in_text = true,
            Ok(Event::End(e)) if e.name().as_ref() == text_tag => in_text = false,
            Ok(Event::Text(e)) if in_text => {
                out.push_str(&e.unescape().unwrap_or_default());
            }
            Ok(Event::End(e)) if e.name().as_ref() == paragraph_tag => {
                if !out.ends_with("\n\n") && !out.is_empty() {
                    out.push_str("\n\n");
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(EngineError::Corrupt {
                    format,
                    detail: format!("malformed XML: {}", e),
                });
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(out.trim_end().to_string())
}

fn render_table(range: &calamine::Range<calamine::Data>) -> String {
    let mut markdown = String::new();
    let mut rows = range.rows();

    let Some(header) = rows.next() else {
        return markdown;
    };

    let header_cells: Vec<String> = header.iter().map(cell_text).collect();
    markdown.push_str(&format!("| {} |\n", header_cells.join(" | ")));
    markdown.push_str(&format!(
        "| {} |\n",
        header_cells
            .iter()
            .map(|_| "---")
            .collect::<Vec<_>>()
            .join(" | ")
    ));

    for row in rows {
        let cells: Vec<String> = row.iter().map(cell_text).collect();
        markdown.push_str(&format!("| {} |\n", cells.join(" | ")));
    }

    markdown
}

fn cell_text(cell: &calamine::Data) -> String {
    cell.to_string().trim().replace('|', "\\|")
}

/// Title/creator from docProps/core.xml, shared by all OOXML containers
fn core_properties(archive: &mut ZipArchive<Cursor<Vec<u8>>>) -> DocumentMetadata {
    let Some(xml) = read_member(archive, "docProps/core.xml") else {
        return DocumentMetadata::default();
    };

    let mut reader = Reader::from_str(&xml);
    let mut buf = Vec::new();
    let mut metadata = DocumentMetadata::default();
    let mut current: Option<&str> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                current = match e.name().as_ref() {
                    b"dc:title" => Some("title"),
                    b"dc:creator" => Some("author"),
                    _ => None,
                };
            }
            Ok(Event::Text(e)) => {
                if let Some(field) = current {
                    let value = e.unescape().unwrap_or_default().trim().to_string();
                    if !value.is_empty() {
                        match field {
                            "title" => metadata.title = Some(value),
                            _ => metadata.author = Some(value),
                        }
                    }
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    metadata
}
