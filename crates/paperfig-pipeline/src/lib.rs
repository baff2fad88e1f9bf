//! # paperfig-pipeline
//!
//! Implementations of `paperfig_core::DiagramPipeline` for the external
//! multi-stage diagram-generation service (retriever → planner → stylist →
//! visualizer → critic). The pipeline's internals stay on the other side of
//! the wire; this crate spools the method text, submits the job, waits it
//! out under a deadline, and lands the produced image on local disk.

mod http;
mod mock;

pub use http::HttpPipeline;
pub use mock::MockPipeline;
