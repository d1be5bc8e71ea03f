use crate::api::error::AppError;
use crate::config::ConverterConfig;
use crate::engine::{EngineError, UniversalEngine};
use crate::services::staging::StagedUpload;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

/// Optional document properties surfaced by a format backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Raw engine output: markdown body plus whatever metadata the format had.
/// An empty body is a valid result for degenerate inputs.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub markdown: String,
    pub metadata: DocumentMetadata,
}

/// Trait for conversion engine implementations.
///
/// The engine only reads the staged file; deleting it is the staging area's
/// job. `convert` takes `&self` so one engine handle serves concurrent runs.
pub trait ConversionEngine: Send + Sync {
    /// Convert the file at `path` to markdown, dispatching by its extension.
    fn convert(&self, path: &Path) -> Result<Conversion, EngineError>;

    /// Short engine identifier for logs and health reporting.
    fn name(&self) -> &'static str;
}

/// No-op engine for development/testing: accepts everything, emits nothing.
pub struct NoOpEngine;

impl ConversionEngine for NoOpEngine {
    fn convert(&self, _path: &Path) -> Result<Conversion, EngineError> {
        tracing::warn!("NoOpEngine: returning empty markdown (development mode)");
        Ok(Conversion {
            markdown: String::new(),
            metadata: DocumentMetadata::default(),
        })
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

/// Factory function to create the process-wide engine based on config.
/// Called once at startup; the handle is shared across all upload runs.
pub fn create_engine(config: &ConverterConfig) -> Arc<dyn ConversionEngine> {
    match config.engine_type.to_lowercase().as_str() {
        "universal" => Arc::new(UniversalEngine::new(config)),
        "noop" | "none" | "disabled" => Arc::new(NoOpEngine),
        other => {
            tracing::warn!("Unknown engine type '{}', using universal engine", other);
            Arc::new(UniversalEngine::new(config))
        }
    }
}

/// The single wrapped call boundary around the engine.
///
/// Runs the conversion on the blocking pool under a timeout, maps every
/// engine failure onto the API taxonomy, and consumes the staged upload so
/// its temp file is removed right after the engine returns — also when the
/// engine fails or panics. On timeout the blocking task keeps running to
/// completion; the staged file is dropped when it finishes.
pub async fn convert_staged(
    engine: Arc<dyn ConversionEngine>,
    staged: StagedUpload,
    timeout: Duration,
) -> Result<Conversion, AppError> {
    let handle = tokio::task::spawn_blocking(move || {
        let result = engine.convert(staged.path());
        // staged file must not outlive the conversion call
        drop(staged);
        result
    });

    match tokio::time::timeout(timeout, handle).await {
        Err(_) => Err(AppError::ConversionTimeout(timeout.as_secs())),
        Ok(Err(join_err)) => Err(AppError::Internal(format!(
            "Conversion task failed: {}",
            join_err
        ))),
        Ok(Ok(Ok(conversion))) => Ok(conversion),
        Ok(Ok(Err(e))) => Err(map_engine_error(e)),
    }
}

fn map_engine_error(e: EngineError) -> AppError {
    match e {
        EngineError::Unsupported { .. } => AppError::UnsupportedFormat(e.to_string()),
        other => AppError::Conversion(other.to_string()),
    }
}

/// Engine that always fails (for testing the failure path)
#[cfg(test)]
pub struct AlwaysFailingEngine;

#[cfg(test)]
impl ConversionEngine for AlwaysFailingEngine {
    fn convert(&self, _path: &Path) -> Result<Conversion, EngineError> {
        Err(EngineError::Corrupt {
            format: "test",
            detail: "synthetic failure".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "always-failing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::staging::StagedUpload;

    struct SlowEngine;

    impl ConversionEngine for SlowEngine {
        fn convert(&self, _path: &Path) -> Result<Conversion, EngineError> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(Conversion {
                markdown: "late".to_string(),
                metadata: DocumentMetadata::default(),
            })
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_noop_engine() {
        let staged = StagedUpload::create(b"anything", "txt").unwrap();
        let conversion = convert_staged(Arc::new(NoOpEngine), staged, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(conversion.markdown.is_empty());
    }

    #[tokio::test]
    async fn test_staged_file_removed_after_success() {
        let staged = StagedUpload::create(b"hello", "txt").unwrap();
        let path = staged.path().to_path_buf();
        convert_staged(Arc::new(NoOpEngine), staged, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_staged_file_removed_after_failure() {
        let staged = StagedUpload::create(b"hello", "txt").unwrap();
        let path = staged.path().to_path_buf();
        let err = convert_staged(Arc::new(AlwaysFailingEngine), staged, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conversion(_)));
        assert!(err.to_string().contains("synthetic failure"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_timeout_classified_as_recoverable() {
        let staged = StagedUpload::create(b"hello", "txt").unwrap();
        let err = convert_staged(Arc::new(SlowEngine), staged, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ConversionTimeout(_)));
    }

    #[test]
    fn test_create_engine_fallback() {
        let mut config = ConverterConfig::development();
        config.engine_type = "noop".to_string();
        assert_eq!(create_engine(&config).name(), "noop");

        config.engine_type = "bogus".to_string();
        assert_eq!(create_engine(&config).name(), "universal");
    }
}
