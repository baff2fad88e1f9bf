//! Mock Pipeline
//!
//! For tests and demo mode. Writes a placeholder image instead of calling
//! the external service, and counts calls so tests can assert that invalid
//! input never reaches the pipeline.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use paperfig_core::{
    CoreError, DiagramPipeline, GenerationRequest, GenerationResult, Result,
};

// Placeholder bytes with a PNG magic header; enough for a download round-trip.
const PLACEHOLDER_PNG: &[u8] = b"\x89PNG\r\n\x1a\npaperfig-demo";

/// Mock pipeline that renders placeholders locally
pub struct MockPipeline {
    output_dir: PathBuf,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl MockPipeline {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Make subsequent calls fail (for testing error paths)
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// How many times the pipeline was actually invoked
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiagramPipeline for MockPipeline {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        request.validate()?;
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(CoreError::Pipeline("mock pipeline failure".into()));
        }

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let image_path = self.output_dir.join(format!("{}.png", Uuid::new_v4()));
        tokio::fs::write(&image_path, PLACEHOLDER_PNG).await?;

        Ok(GenerationResult { image_path })
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperfig_core::DiagramType;

    fn request() -> GenerationRequest {
        GenerationRequest::new(
            "Our method comprises three stages.",
            "Method overview",
            None,
            DiagramType::Flowchart,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_mock_writes_an_image() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = MockPipeline::new(dir.path());

        let result = pipeline.generate(&request()).await.unwrap();
        assert!(result.image_path.exists());
        assert_eq!(pipeline.call_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_issues_no_call() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = MockPipeline::new(dir.path());

        let invalid = GenerationRequest {
            source_text: String::new(),
            caption: "caption".into(),
            title: None,
            diagram_type: DiagramType::Methodology,
        };
        let err = pipeline.generate(&invalid).await.unwrap_err();

        assert!(matches!(err, CoreError::InvalidInput(_)));
        assert_eq!(pipeline.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = MockPipeline::new(dir.path());
        pipeline.set_failing(true);

        let err = pipeline.generate(&request()).await.unwrap_err();
        assert!(matches!(err, CoreError::Pipeline(_)));
        assert_eq!(pipeline.call_count(), 1);
    }
}
