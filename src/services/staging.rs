use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// An uploaded file staged to a uniquely named temporary path.
///
/// The path keeps the original extension as its suffix because the engine
/// dispatches by extension. Removal is tied to `Drop`, so the staged file is
/// gone on every exit path of the staging-to-conversion span, including
/// panics. Nothing else may delete it.
pub struct StagedUpload {
    file: NamedTempFile,
    extension: String,
}

impl StagedUpload {
    /// Writes the uploaded bytes fully to a fresh temp file before returning.
    pub fn create(bytes: &[u8], extension: &str) -> std::io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("mdconvert-")
            .suffix(&format!(".{}", extension))
            .tempfile()?;

        file.write_all(bytes)?;
        file.flush()?;

        tracing::debug!(
            path = %file.path().display(),
            size = bytes.len(),
            "staged upload"
        );

        Ok(Self {
            file,
            extension: extension.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

/// Stages on the blocking pool; the upload body is already in memory but the
/// write itself hits disk.
pub async fn stage(bytes: Vec<u8>, extension: String) -> std::io::Result<StagedUpload> {
    tokio::task::spawn_blocking(move || StagedUpload::create(&bytes, &extension))
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?
}
