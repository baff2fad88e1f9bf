//! Application State

use std::sync::Arc;

use paperfig_core::{AppConfig, DiagramPipeline, MemorySessionStore};
use paperfig_payments::{Billing, PlanCatalog, WebhookVerifier};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Typed configuration, validated at startup
    pub config: Arc<AppConfig>,

    /// Per-browser sessions
    pub sessions: Arc<MemorySessionStore>,

    /// Payments provider (Stripe, or the demo stub)
    pub billing: Arc<dyn Billing>,

    /// External diagram pipeline (HTTP, or the mock)
    pub pipeline: Arc<dyn DiagramPipeline>,

    /// Immutable plan catalog
    pub catalog: Arc<PlanCatalog>,

    /// Webhook verifier (None when Stripe is not configured)
    pub webhooks: Option<Arc<WebhookVerifier>>,
}
