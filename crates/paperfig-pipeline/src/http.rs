//! HTTP Pipeline Client
//!
//! Talks to the diagram service over its job API: multipart submit of the
//! spooled method text, JSON response with the image location, download of
//! the finished raster.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

use paperfig_core::{
    CoreError, DiagramPipeline, GenerationRequest, GenerationResult, Result,
};

/// Client for the external diagram pipeline service
pub struct HttpPipeline {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    output_dir: PathBuf,
    spool_dir: PathBuf,
}

impl HttpPipeline {
    /// Create a new pipeline client
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
            output_dir: output_dir.into(),
            spool_dir: std::env::temp_dir(),
        }
    }

    /// Override where input spool files are created
    pub fn with_spool_dir(mut self, spool_dir: impl Into<PathBuf>) -> Self {
        self.spool_dir = spool_dir.into();
        self
    }

    /// Spool the method text into a scoped temp file
    ///
    /// The returned guard deletes the file on drop, which covers success,
    /// failure, and cancellation alike.
    fn spool_source(&self, source_text: &str) -> Result<NamedTempFile> {
        let mut spool = tempfile::Builder::new()
            .prefix("paperfig-input-")
            .suffix(".txt")
            .tempfile_in(&self.spool_dir)?;
        spool.write_all(source_text.as_bytes())?;
        spool.flush()?;
        Ok(spool)
    }

    async fn run(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let spool = self.spool_source(&request.source_text)?;
        debug!(path = %spool.path().display(), "Spooled method text");

        let source = tokio::fs::read(spool.path()).await?;
        let part = reqwest::multipart::Part::bytes(source)
            .file_name("method.txt")
            .mime_str("text/plain")
            .map_err(|e| CoreError::Pipeline(e.to_string()))?;

        let mut form = reqwest::multipart::Form::new()
            .part("source", part)
            .text("communicative_intent", request.caption.clone())
            .text("diagram_type", request.diagram_type.as_str());
        if let Some(title) = &request.title {
            form = form.text("title", title.clone());
        }

        let response = self
            .client
            .post(format!("{}/v1/diagrams", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| CoreError::Pipeline(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::Pipeline(format!(
                "pipeline returned {}: {}",
                status, body
            )));
        }

        let job: DiagramResponse = response
            .json()
            .await
            .map_err(|e| CoreError::Pipeline(e.to_string()))?;

        let image = self.fetch_image(&job.image_url).await?;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let image_path = self.output_dir.join(format!("{}.png", Uuid::new_v4()));
        tokio::fs::write(&image_path, image).await?;

        info!(path = %image_path.display(), "Diagram generated");
        Ok(GenerationResult { image_path })
    }

    async fn fetch_image(&self, image_url: &str) -> Result<Vec<u8>> {
        let url = if image_url.starts_with("http://") || image_url.starts_with("https://") {
            image_url.to_string()
        } else {
            format!("{}/{}", self.base_url, image_url.trim_start_matches('/'))
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CoreError::Pipeline(e.to_string()))?;
        if !response.status().is_success() {
            return Err(CoreError::Pipeline(format!(
                "image download returned {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CoreError::Pipeline(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[derive(Debug, Deserialize)]
struct DiagramResponse {
    image_url: String,
}

#[async_trait]
impl DiagramPipeline for HttpPipeline {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        request.validate()?;

        match tokio::time::timeout(self.timeout, self.run(request)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(CoreError::Timeout(self.timeout.as_secs())),
        }
    }

    async fn health_check(&self) -> bool {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use paperfig_core::DiagramType;

    fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    // Nothing listens on TCP port 1 without root, so requests fail fast.
    fn unreachable_pipeline(spool_dir: &Path, output_dir: &Path) -> HttpPipeline {
        HttpPipeline::new("http://127.0.0.1:1", Duration::from_secs(5), output_dir)
            .with_spool_dir(spool_dir)
    }

    #[test]
    fn test_spool_file_removed_on_drop() {
        let spool_dir = tempfile::tempdir().unwrap();
        let pipeline = unreachable_pipeline(spool_dir.path(), spool_dir.path());

        let spool = pipeline.spool_source("Our method comprises three stages.").unwrap();
        let path = spool.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Our method comprises three stages."
        );

        drop(spool);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_invalid_input_spools_nothing() {
        let spool_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        let pipeline = unreachable_pipeline(spool_dir.path(), output_dir.path());

        let request = GenerationRequest {
            source_text: "   ".into(),
            caption: "caption".into(),
            title: None,
            diagram_type: DiagramType::Methodology,
        };
        let err = pipeline.generate(&request).await.unwrap_err();

        assert!(matches!(err, CoreError::InvalidInput(_)));
        assert!(dir_is_empty(spool_dir.path()));
    }

    #[tokio::test]
    async fn test_spool_cleaned_up_when_pipeline_fails() {
        let spool_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        let pipeline = unreachable_pipeline(spool_dir.path(), output_dir.path());

        let request = GenerationRequest::new(
            "Our method comprises three stages.",
            "Method overview",
            None,
            DiagramType::Methodology,
        )
        .unwrap();
        let err = pipeline.generate(&request).await.unwrap_err();

        assert!(matches!(err, CoreError::Pipeline(_) | CoreError::Timeout(_)));
        assert!(dir_is_empty(spool_dir.path()));
        assert!(dir_is_empty(output_dir.path()));
    }
}
