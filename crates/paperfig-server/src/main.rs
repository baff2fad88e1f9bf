//! paperfig HTTP Server
//!
//! Axum-based server for the diagram studio: cookie sessions, the
//! login/paywall/workspace flow, Stripe checkout, and the external
//! diagram pipeline.

mod handlers;
mod session_cookie;
mod state;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paperfig_core::{AppConfig, DiagramPipeline, MemorySessionStore, SessionStore};
use paperfig_payments::{Billing, DemoBilling, PlanCatalog, StripeBilling, WebhookVerifier};
use paperfig_pipeline::{HttpPipeline, MockPipeline};

use crate::handlers::{
    create_checkout, current_view, download_diagram, generate_diagram, health_check,
    list_plans, login, logout, refresh_subscription, stripe_webhook,
};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    // Configuration is all-or-nothing: a missing key stops startup here.
    let config = Arc::new(AppConfig::from_env().context("invalid configuration")?);

    if config.demo_mode {
        tracing::warn!("⚠ DEMO MODE: billing and pipeline are stubbed, everyone gets Pro");
    }

    // Plan catalog (immutable from here on)
    let (pro_price, enterprise_price) = match &config.stripe {
        Some(stripe) => (
            stripe.pro_price_id.clone(),
            stripe.enterprise_price_id.clone(),
        ),
        None => (None, None),
    };
    if !config.demo_mode {
        if pro_price.is_none() {
            tracing::warn!("⚠ PRICE_ID_PRO not set - pro checkout disabled");
        }
        if enterprise_price.is_none() {
            tracing::warn!("⚠ PRICE_ID_ENTERPRISE not set - enterprise checkout disabled");
        }
    }
    let catalog = Arc::new(PlanCatalog::new(pro_price, enterprise_price));

    // Billing client
    let billing: Arc<dyn Billing> = match &config.stripe {
        Some(stripe) => {
            tracing::info!("✓ Stripe configured");
            Arc::new(StripeBilling::new(&stripe.secret_key, catalog.clone()))
        }
        None => Arc::new(DemoBilling::new(catalog.clone())),
    };
    let webhooks = config
        .stripe
        .as_ref()
        .map(|s| Arc::new(WebhookVerifier::new(&s.webhook_secret)));

    // Diagram pipeline client
    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating output dir {}", config.output_dir.display()))?;
    let pipeline: Arc<dyn DiagramPipeline> = match &config.pipeline {
        Some(endpoint) => Arc::new(HttpPipeline::new(
            endpoint.base_url.clone(),
            config.pipeline_timeout,
            config.output_dir.clone(),
        )),
        None => Arc::new(MockPipeline::new(config.output_dir.clone())),
    };
    if pipeline.health_check().await {
        tracing::info!("✓ Connected to diagram pipeline ({})", pipeline.name());
    } else {
        tracing::warn!("⚠ Diagram pipeline not reachable - generation will fail");
    }

    // Sessions, swept periodically
    let sessions = Arc::new(MemorySessionStore::new());
    {
        let sessions = sessions.clone();
        let max_idle = chrono::Duration::from_std(config.session_idle)
            .unwrap_or_else(|_| chrono::Duration::hours(1));
        let every = (config.session_idle / 2).max(std::time::Duration::from_secs(60));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                match sessions.purge_idle(max_idle) {
                    Ok(0) => {}
                    Ok(n) => tracing::info!("Purged {} idle sessions", n),
                    Err(e) => tracing::error!("Session sweep failed: {}", e),
                }
            }
        });
    }

    // Build application state
    let state = AppState {
        config: config.clone(),
        sessions,
        billing,
        pipeline,
        catalog,
        webhooks,
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Session-scoped API routes
    let api = Router::new()
        .route("/api/view", get(current_view))
        .route("/api/plans", get(list_plans))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/checkout", post(create_checkout))
        .route("/api/subscription/refresh", post(refresh_subscription))
        .route("/api/generate", post(generate_diagram))
        .route("/api/diagram", get(download_diagram))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_cookie::session_middleware,
        ));

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/webhook/stripe", post(stripe_webhook))
        .merge(api)
        // Static files (WASM frontend)
        .fallback_service(ServeDir::new("static"))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 paperfig server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                    - Health check");
    tracing::info!("  GET  /api/view                  - Current view state");
    tracing::info!("  GET  /api/plans                 - Plan catalog");
    tracing::info!("  POST /api/login                 - Email login");
    tracing::info!("  POST /api/logout                - Logout");
    tracing::info!("  POST /api/checkout              - Create Stripe checkout");
    tracing::info!("  POST /api/subscription/refresh  - Re-verify subscription");
    tracing::info!("  POST /api/generate              - Generate a diagram");
    tracing::info!("  GET  /api/diagram               - Download the last diagram");
    tracing::info!("  POST /webhook/stripe            - Stripe webhooks");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
