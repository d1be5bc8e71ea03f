use crate::engine::error::EngineError;
use crate::engine::image::OcrClient;
use crate::services::converter::{Conversion, DocumentMetadata};
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Zip upload: every supported member is converted and concatenated in
/// archive order under a `## <member name>` heading. Unsupported members and
/// nested archives are listed with a skip note instead of failing the run;
/// an unreadable member does fail it.
pub fn convert(bytes: &[u8], ocr: Option<&OcrClient>) -> Result<Conversion, EngineError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).map_err(|e| {
        EngineError::Corrupt {
            format: "ZIP",
            detail: e.to_string(),
        }
    })?;

    let mut markdown = String::new();

    for index in 0..archive.len() {
        let mut member = archive.by_index(index).map_err(|e| EngineError::ArchiveMember {
            name: format!("#{}", index),
            detail: e.to_string(),
        })?;

        if member.is_dir() {
            continue;
        }

        let name = member.name().to_string();
        let extension = name.rsplit('.').next().unwrap_or("").to_lowercase();

        if !markdown.is_empty() {
            markdown.push('\n');
        }
        markdown.push_str(&format!("## {}\n\n", name));

        if extension == "zip" {
            markdown.push_str("*Nested archive skipped.*\n");
            continue;
        }

        let mut data = Vec::new();
        member
            .read_to_end(&mut data)
            .map_err(|e| EngineError::ArchiveMember {
                name: name.clone(),
                detail: e.to_string(),
            })?;

        match crate::engine::convert_bytes(&data, &extension, ocr) {
            Ok(conversion) => {
                if conversion.markdown.is_empty() {
                    markdown.push_str("*No text content.*\n");
                } else {
                    markdown.push_str(&conversion.markdown);
                    markdown.push('\n');
                }
            }
            Err(EngineError::Unsupported { extension }) => {
                markdown.push_str(&format!("*Skipped: '.{}' is not convertible.*\n", extension));
            }
            Err(e) => {
                return Err(EngineError::ArchiveMember {
                    name,
                    detail: e.to_string(),
                });
            }
        }
    }

    Ok(Conversion {
        markdown: markdown.trim_end().to_string(),
        metadata: DocumentMetadata::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn build_zip(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            for (name, content) in members {
                writer.start_file(*name, FileOptions::default()).unwrap();
                writer.write_all(content).unwrap();
            }
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_members_concatenated_in_order() {
        let bytes = build_zip(&[
            ("first.txt", b"alpha content"),
            ("second.md", b"beta content"),
        ]);
        let conversion = convert(&bytes, None).unwrap();

        assert!(conversion.markdown.contains("## first.txt"));
        assert!(conversion.markdown.contains("alpha content"));
        assert!(conversion.markdown.contains("## second.md"));
        let first = conversion.markdown.find("alpha content").unwrap();
        let second = conversion.markdown.find("beta content").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_unsupported_member_noted() {
        let bytes = build_zip(&[("tool.bin", b"xyz"), ("notes.txt", b"keep me")]);
        let conversion = convert(&bytes, None).unwrap();
        assert!(conversion.markdown.contains("not convertible"));
        assert!(conversion.markdown.contains("keep me"));
    }

    #[test]
    fn test_nested_zip_skipped() {
        let inner = build_zip(&[("deep.txt", b"hidden")]);
        let bytes = build_zip(&[("inner.zip", &inner)]);
        let conversion = convert(&bytes, None).unwrap();
        assert!(conversion.markdown.contains("Nested archive skipped"));
        assert!(!conversion.markdown.contains("hidden"));
    }

    #[test]
    fn test_corrupt_member_fails_run() {
        let bytes = build_zip(&[("broken.pdf", b"not really a pdf")]);
        let err = convert(&bytes, None).unwrap_err();
        assert!(matches!(err, EngineError::ArchiveMember { .. }));
        assert!(err.to_string().contains("broken.pdf"));
    }

    #[test]
    fn test_not_a_zip() {
        let err = convert(b"garbage", None).unwrap_err();
        assert!(matches!(err, EngineError::Corrupt { format: "ZIP", .. }));
    }
}
