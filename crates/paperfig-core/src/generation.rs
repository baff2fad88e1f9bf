//! Diagram Generation
//!
//! Request/result types and the pipeline trait. The multi-stage pipeline
//! itself (retriever, planner, stylist, visualizer, critic) is an external
//! collaborator; implementations of `DiagramPipeline` only carry text in
//! and an image path out.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Output style the pipeline is steered toward
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramType {
    Methodology,
    Flowchart,
    Architecture,
}

impl DiagramType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramType::Methodology => "methodology",
            DiagramType::Flowchart => "flowchart",
            DiagramType::Architecture => "architecture",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "methodology" => Some(DiagramType::Methodology),
            "flowchart" => Some(DiagramType::Flowchart),
            "architecture" => Some(DiagramType::Architecture),
            _ => None,
        }
    }
}

impl std::fmt::Display for DiagramType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One generation submission
///
/// Constructed fresh per submission and never persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The pasted method description
    pub source_text: String,

    /// Communicative intent: what the diagram should depict
    pub caption: String,

    /// Optional figure title
    pub title: Option<String>,

    /// Output style selector
    pub diagram_type: DiagramType,
}

impl GenerationRequest {
    /// Build a request, rejecting empty text or caption up front
    pub fn new(
        source_text: impl Into<String>,
        caption: impl Into<String>,
        title: Option<String>,
        diagram_type: DiagramType,
    ) -> Result<Self> {
        let request = Self {
            source_text: source_text.into(),
            caption: caption.into(),
            title,
            diagram_type,
        };
        request.validate()?;
        Ok(request)
    }

    /// Reject empty inputs before any external work happens
    pub fn validate(&self) -> Result<()> {
        if self.source_text.trim().is_empty() {
            return Err(CoreError::InvalidInput("the method text".into()));
        }
        if self.caption.trim().is_empty() {
            return Err(CoreError::InvalidInput("a caption".into()));
        }
        Ok(())
    }
}

/// A finished generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Filesystem path of the produced raster image
    pub image_path: PathBuf,
}

/// Strategy trait for the external diagram pipeline
///
/// `generate` is a long call (seconds to minutes). Implementations must
/// validate input before contacting the pipeline, clean up any spooled
/// input artifacts on every exit path, and surface timeouts distinctly.
#[async_trait]
pub trait DiagramPipeline: Send + Sync {
    /// Run the pipeline for one request
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult>;

    /// Whether the pipeline endpoint is reachable
    async fn health_check(&self) -> bool;

    /// Implementation name, for logs and the health endpoint
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_text_rejected() {
        let err = GenerationRequest::new("", "caption", None, DiagramType::Methodology)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn test_whitespace_caption_rejected() {
        let err = GenerationRequest::new("some method", "   ", None, DiagramType::Flowchart)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn test_valid_request() {
        let request = GenerationRequest::new(
            "Our TLIF technique comprises three stages.",
            "TLIF L5/S1 overview",
            Some("Figure 1".into()),
            DiagramType::Methodology,
        )
        .unwrap();
        assert_eq!(request.diagram_type, DiagramType::Methodology);
    }

    #[test]
    fn test_diagram_type_parse() {
        assert_eq!(DiagramType::parse("Flowchart"), Some(DiagramType::Flowchart));
        assert_eq!(DiagramType::parse("unknown"), None);
    }
}
