//! HTTP Handlers
//!
//! One handler per user action. Every action handler loads the session,
//! checks the action against the current view, applies the mutation, and
//! returns the updated view state. Actions invoked from a view that does
//! not offer them are inert: the current view comes back unchanged.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use paperfig_core::{
    auth, Action, CoreError, DiagramPipeline, DiagramType, GenerationRequest, PlanId,
    Session, SessionId, SessionStore, SubscriptionLookup, ViewState,
};
use paperfig_payments::{
    Billing, BillingError, CheckoutRequest as BillingCheckoutRequest, SubscriptionPlan,
};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub billing: String,
    pub pipeline: String,
    pub pipeline_connected: bool,
    pub demo_mode: bool,
}

/// Session snapshot the frontend renders from
#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub view: ViewState,
    pub email: Option<String>,
    pub is_subscribed: bool,
    pub plan: Option<PlanId>,
    pub valid_until: Option<DateTime<Utc>>,
    pub pending_checkout_plan: Option<PlanId>,
    pub has_diagram: bool,
}

impl ViewResponse {
    fn from_session(session: &Session) -> Self {
        Self {
            view: ViewState::for_session(session, Utc::now()),
            email: session.user_email.clone(),
            is_subscribed: session.is_subscribed,
            plan: session.plan,
            valid_until: session.valid_until,
            pending_checkout_plan: session.pending_checkout_plan,
            has_diagram: session.last_diagram.is_some(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutActionRequest {
    pub plan: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutActionResponse {
    /// Hosted checkout URL to redirect to; absent when the action was inert
    pub checkout_url: Option<String>,
    pub checkout_session_id: Option<String>,
    pub view: ViewResponse,
}

#[derive(Debug, Deserialize)]
pub struct GenerateActionRequest {
    pub source_text: String,
    pub caption: String,
    #[serde(default)]
    pub title: Option<String>,
    pub diagram_type: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateActionResponse {
    pub generated: bool,
    pub view: ViewResponse,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn error_response(status: StatusCode, code: &str, message: String) -> HandlerError {
    (
        status,
        Json(ErrorResponse {
            error: message,
            code: code.into(),
        }),
    )
}

fn core_error(e: &CoreError) -> HandlerError {
    let (status, code) = match e {
        CoreError::InvalidEmail => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_EMAIL"),
        CoreError::InvalidInput(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_INPUT"),
        CoreError::Provider(_) => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR"),
        CoreError::Pipeline(_) => (StatusCode::BAD_GATEWAY, "PIPELINE_ERROR"),
        CoreError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "PIPELINE_TIMEOUT"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    };
    error_response(status, code, e.user_message())
}

fn billing_error(e: &BillingError) -> HandlerError {
    let (status, code) = match e {
        BillingError::PlanNotConfigured(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "PLAN_NOT_CONFIGURED")
        }
        BillingError::PaymentDeclined(_) => (StatusCode::PAYMENT_REQUIRED, "PAYMENT_DECLINED"),
        BillingError::Provider(_) => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "BILLING_ERROR"),
    };
    error_response(status, code, e.user_message())
}

fn load_session(state: &AppState, id: &SessionId) -> Result<Session, HandlerError> {
    state
        .sessions
        .load(id)
        .ok()
        .flatten()
        .ok_or_else(|| {
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "SESSION_ERROR",
                "Your session could not be found. Please reload.".into(),
            )
        })
}

fn save_session(state: &AppState, session: &Session) -> Result<(), HandlerError> {
    state.sessions.save(session).map_err(|e| {
        error!(error = %e, "Failed to save session");
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "SESSION_ERROR",
            "Your session could not be updated. Please retry.".into(),
        )
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let pipeline_connected = state.pipeline.health_check().await;

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        billing: state.billing.name().to_string(),
        pipeline: state.pipeline.name().to_string(),
        pipeline_connected,
        demo_mode: state.config.demo_mode,
    })
}

/// Current view for this session
pub async fn current_view(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
) -> Result<Json<ViewResponse>, HandlerError> {
    let session = load_session(&state, &session_id)?;
    Ok(Json(ViewResponse::from_session(&session)))
}

/// Plan catalog for the paywall cards
pub async fn list_plans(State(state): State<AppState>) -> Json<Vec<SubscriptionPlan>> {
    Json(state.catalog.plans().to_vec())
}

/// Establish an identity from a submitted email
pub async fn login(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ViewResponse>, HandlerError> {
    let mut session = load_session(&state, &session_id)?;

    if !ViewState::for_session(&session, Utc::now()).allows(Action::Login) {
        debug!(session = %session_id, "Login while already authenticated; no-op");
        return Ok(Json(ViewResponse::from_session(&session)));
    }

    auth::authenticate(&mut session, &payload.email, state.billing.as_ref())
        .await
        .map_err(|e| core_error(&e))?;
    save_session(&state, &session)?;

    info!(session = %session_id, view = %ViewState::for_session(&session, Utc::now()), "User logged in");
    Ok(Json(ViewResponse::from_session(&session)))
}

/// Clear identity and subscription state; idempotent
pub async fn logout(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
) -> Result<Json<ViewResponse>, HandlerError> {
    let mut session = load_session(&state, &session_id)?;
    auth::logout(&mut session);
    save_session(&state, &session)?;
    Ok(Json(ViewResponse::from_session(&session)))
}

/// Start a hosted checkout for a plan
pub async fn create_checkout(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
    Json(payload): Json<CheckoutActionRequest>,
) -> Result<Json<CheckoutActionResponse>, HandlerError> {
    let mut session = load_session(&state, &session_id)?;

    if !ViewState::for_session(&session, Utc::now()).allows(Action::Subscribe) {
        debug!(session = %session_id, "Checkout outside the paywall; no-op");
        return Ok(Json(CheckoutActionResponse {
            checkout_url: None,
            checkout_session_id: None,
            view: ViewResponse::from_session(&session),
        }));
    }

    let plan = PlanId::parse(&payload.plan).ok_or_else(|| {
        billing_error(&BillingError::PlanNotConfigured(payload.plan.clone()))
    })?;

    let request = BillingCheckoutRequest {
        plan,
        customer_email: session.user_email.clone(),
        success_url: format!("{}/workspace?checkout=success", state.config.base_url),
        cancel_url: format!("{}/pricing?checkout=cancelled", state.config.base_url),
    };

    let checkout = state
        .billing
        .create_checkout_session(request)
        .await
        .map_err(|e| {
            warn!(session = %session_id, plan = %plan, error = %e, "Checkout failed");
            billing_error(&e)
        })?;

    session.pending_checkout_plan = Some(plan);
    session.touch();
    save_session(&state, &session)?;

    info!(session = %session_id, plan = %plan, "Checkout session created");
    Ok(Json(CheckoutActionResponse {
        checkout_url: Some(checkout.checkout_url),
        checkout_session_id: Some(checkout.id),
        view: ViewResponse::from_session(&session),
    }))
}

/// Re-verify the subscription against the provider
///
/// Called after returning from checkout, and whenever the frontend wants
/// the expiry transition re-evaluated.
pub async fn refresh_subscription(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
) -> Result<Json<ViewResponse>, HandlerError> {
    let mut session = load_session(&state, &session_id)?;

    let Some(email) = session.user_email.clone() else {
        debug!(session = %session_id, "Subscription refresh without identity; no-op");
        return Ok(Json(ViewResponse::from_session(&session)));
    };

    // A lookup failure leaves the session as it was; the user can retry.
    let check = state
        .billing
        .check_subscription(&email)
        .await
        .map_err(|e| {
            warn!(session = %session_id, error = %e, "Subscription lookup failed");
            core_error(&e)
        })?;

    session.apply_subscription(&check);
    save_session(&state, &session)?;

    Ok(Json(ViewResponse::from_session(&session)))
}

/// Run the diagram pipeline for a submission
pub async fn generate_diagram(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
    Json(payload): Json<GenerateActionRequest>,
) -> Result<Json<GenerateActionResponse>, HandlerError> {
    let session = load_session(&state, &session_id)?;

    if !ViewState::for_session(&session, Utc::now()).allows(Action::Generate) {
        debug!(session = %session_id, "Generate outside the workspace; no-op");
        return Ok(Json(GenerateActionResponse {
            generated: false,
            view: ViewResponse::from_session(&session),
        }));
    }

    let diagram_type = DiagramType::parse(&payload.diagram_type).ok_or_else(|| {
        core_error(&CoreError::InvalidInput("a diagram type".into()))
    })?;
    let request = GenerationRequest::new(
        payload.source_text,
        payload.caption,
        payload.title,
        diagram_type,
    )
    .map_err(|e| core_error(&e))?;

    // The session is not held across the pipeline call; generation for one
    // session must not block anything else.
    let result = state.pipeline.generate(&request).await.map_err(|e| {
        error!(session = %session_id, error = %e, "Generation failed");
        core_error(&e)
    })?;

    // Re-load: the user may have logged out while the pipeline ran.
    let mut session = load_session(&state, &session_id)?;
    if !ViewState::for_session(&session, Utc::now()).allows(Action::Generate) {
        warn!(session = %session_id, "Session left the workspace during generation; discarding result");
        return Ok(Json(GenerateActionResponse {
            generated: false,
            view: ViewResponse::from_session(&session),
        }));
    }

    session.last_diagram = Some(result.image_path);
    session.touch();
    save_session(&state, &session)?;

    info!(session = %session_id, "Diagram ready");
    Ok(Json(GenerateActionResponse {
        generated: true,
        view: ViewResponse::from_session(&session),
    }))
}

/// Download the last generated diagram
pub async fn download_diagram(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
) -> Response {
    let Ok(session) = load_session(&state, &session_id) else {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "SESSION_ERROR",
            "Your session could not be found. Please reload.".into(),
        )
        .into_response();
    };

    let allowed = ViewState::for_session(&session, Utc::now()).allows(Action::Download);
    let Some(path) = session.last_diagram.filter(|_| allowed) else {
        return error_response(
            StatusCode::NOT_FOUND,
            "NO_DIAGRAM",
            "No diagram has been generated yet.".into(),
        )
        .into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "image/png"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"paperfig-diagram.png\"",
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to read diagram");
            error_response(
                StatusCode::NOT_FOUND,
                "NO_DIAGRAM",
                "The generated diagram is no longer available.".into(),
            )
            .into_response()
        }
    }
}

/// Stripe webhook endpoint
///
/// Verifies the signature, then pushes subscription changes into any live
/// sessions for the event's customer email. With no durable subscription
/// store, events without an email are logged and dropped.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, HandlerError> {
    let verifier = state.webhooks.as_ref().ok_or_else(|| {
        error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "PAYMENTS_DISABLED",
            "Payments are not configured.".into(),
        )
    })?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            error_response(
                StatusCode::BAD_REQUEST,
                "MISSING_SIGNATURE",
                "Missing Stripe signature.".into(),
            )
        })?;

    let event = verifier.parse(&body, signature).map_err(|e| {
        warn!(error = %e, "Webhook rejected");
        let code = match e {
            BillingError::WebhookSignature(_) => "INVALID_SIGNATURE",
            _ => "WEBHOOK_PARSE",
        };
        error_response(StatusCode::BAD_REQUEST, code, "Invalid webhook payload.".into())
    })?;

    info!(event = ?event, "Processing Stripe webhook");

    match event.customer_email() {
        Some(email) => refresh_sessions_for(&state, email).await,
        None => debug!("Webhook event carries no customer email; dropped"),
    }

    Ok(StatusCode::OK)
}

/// Re-verify every live session belonging to an email
async fn refresh_sessions_for(state: &AppState, email: &str) {
    let ids = match state.sessions.find_by_email(email) {
        Ok(ids) => ids,
        Err(e) => {
            error!(error = %e, "Session lookup failed");
            return;
        }
    };
    if ids.is_empty() {
        debug!(email = %email, "No live sessions for webhook customer");
        return;
    }

    match state.billing.check_subscription(email).await {
        Ok(check) => {
            for id in ids {
                if let Ok(Some(mut session)) = state.sessions.load(&id) {
                    session.apply_subscription(&check);
                    if let Err(e) = state.sessions.save(&session) {
                        error!(session = %id, error = %e, "Failed to update session");
                    }
                }
            }
            info!(email = %email, "Sessions refreshed from webhook");
        }
        Err(e) => warn!(email = %email, error = %e, "Webhook-triggered lookup failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;

    use paperfig_core::{
        AppConfig, Result as CoreResult, SubscriptionCheck, SubscriptionLookup,
    };
    use paperfig_payments::{
        Billing, CheckoutSession, PlanCatalog, Result as BillingResult,
    };
    use paperfig_pipeline::MockPipeline;

    /// Stub provider: checkout URLs embed the configured price id, and the
    /// subscription can be flipped active to simulate a completed payment.
    struct StubBilling {
        catalog: Arc<PlanCatalog>,
        active: AtomicBool,
    }

    impl StubBilling {
        fn new(catalog: Arc<PlanCatalog>) -> Self {
            Self {
                catalog,
                active: AtomicBool::new(false),
            }
        }

        fn set_active(&self, active: bool) {
            self.active.store(active, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl SubscriptionLookup for StubBilling {
        async fn check_subscription(&self, _email: &str) -> CoreResult<SubscriptionCheck> {
            if self.active.load(Ordering::SeqCst) {
                Ok(SubscriptionCheck::active(
                    PlanId::Pro,
                    Utc::now() + ChronoDuration::days(30),
                ))
            } else {
                Ok(SubscriptionCheck::inactive())
            }
        }
    }

    #[async_trait]
    impl Billing for StubBilling {
        async fn create_checkout_session(
            &self,
            request: BillingCheckoutRequest,
        ) -> BillingResult<CheckoutSession> {
            let price_id = self
                .catalog
                .get(request.plan)
                .and_then(|p| p.price_id.clone())
                .ok_or_else(|| BillingError::PlanNotConfigured(request.plan.to_string()))?;
            Ok(CheckoutSession {
                id: "cs_test_1".into(),
                checkout_url: format!("https://checkout.stripe.test/pay/{}", price_id),
                plan: request.plan,
            })
        }

        fn name(&self) -> &str {
            "Stub"
        }
    }

    struct TestHarness {
        state: AppState,
        session_id: SessionId,
        billing: Arc<StubBilling>,
        pipeline: Arc<MockPipeline>,
        _output_dir: tempfile::TempDir,
    }

    fn harness() -> TestHarness {
        let output_dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(PlanCatalog::new(Some("price_pro_123".into()), None));
        let billing = Arc::new(StubBilling::new(catalog.clone()));
        let pipeline = Arc::new(MockPipeline::new(output_dir.path()));
        let sessions = Arc::new(paperfig_core::MemorySessionStore::new());

        let session = Session::new();
        let session_id = session.id.clone();
        sessions.save(&session).unwrap();

        let config = Arc::new(AppConfig {
            bind_addr: "127.0.0.1:0".into(),
            base_url: "https://paperfig.test".into(),
            demo_mode: false,
            stripe: None,
            pipeline: None,
            pipeline_timeout: Duration::from_secs(5),
            output_dir: output_dir.path().into(),
            session_idle: Duration::from_secs(3600),
        });

        let state = AppState {
            config,
            sessions,
            billing: billing.clone(),
            pipeline: pipeline.clone(),
            catalog,
            webhooks: None,
        };

        TestHarness {
            state,
            session_id,
            billing,
            pipeline,
            _output_dir: output_dir,
        }
    }

    fn generate_body() -> GenerateActionRequest {
        GenerateActionRequest {
            source_text: "Our TLIF technique comprises three stages.".into(),
            caption: "TLIF L5/S1 overview".into(),
            title: Some("Figure 1".into()),
            diagram_type: "methodology".into(),
        }
    }

    #[tokio::test]
    async fn test_login_with_invalid_email_is_rejected() {
        let h = harness();

        let (status, body) = login(
            State(h.state.clone()),
            Extension(h.session_id.clone()),
            Json(LoginRequest {
                email: "not-an-email".into(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.code, "INVALID_EMAIL");

        let session = h.state.sessions.load(&h.session_id).unwrap().unwrap();
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_generate_is_inert_outside_workspace() {
        let h = harness();

        let response = generate_diagram(
            State(h.state.clone()),
            Extension(h.session_id.clone()),
            Json(generate_body()),
        )
        .await
        .unwrap();

        assert!(!response.generated);
        assert_eq!(response.view.view, ViewState::Landing);
        assert_eq!(h.pipeline.call_count(), 0);
    }

    #[tokio::test]
    async fn test_checkout_unconfigured_plan() {
        let h = harness();

        login(
            State(h.state.clone()),
            Extension(h.session_id.clone()),
            Json(LoginRequest { email: "a@b.ch".into() }),
        )
        .await
        .unwrap();

        let (status, body) = create_checkout(
            State(h.state.clone()),
            Extension(h.session_id.clone()),
            Json(CheckoutActionRequest {
                plan: "enterprise".into(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.code, "PLAN_NOT_CONFIGURED");
    }

    #[tokio::test]
    async fn test_end_to_end_subscription_flow() {
        let h = harness();

        // Landing → Paywall: no active subscription yet.
        let view = login(
            State(h.state.clone()),
            Extension(h.session_id.clone()),
            Json(LoginRequest { email: "a@b.ch".into() }),
        )
        .await
        .unwrap();
        assert_eq!(view.view, ViewState::Paywall);

        // Subscribe to pro: checkout URL carries the configured price id.
        let checkout = create_checkout(
            State(h.state.clone()),
            Extension(h.session_id.clone()),
            Json(CheckoutActionRequest { plan: "pro".into() }),
        )
        .await
        .unwrap();
        assert!(checkout.checkout_url.as_deref().unwrap().contains("price_pro_123"));
        assert_eq!(checkout.view.pending_checkout_plan, Some(PlanId::Pro));

        // Payment completes on the provider side.
        h.billing.set_active(true);

        // Paywall → Workspace on re-verification.
        let view = refresh_subscription(
            State(h.state.clone()),
            Extension(h.session_id.clone()),
        )
        .await
        .unwrap();
        assert_eq!(view.view, ViewState::Workspace);
        assert_eq!(view.plan, Some(PlanId::Pro));
        assert!(view.pending_checkout_plan.is_none());

        // Generate a diagram in the workspace.
        let generated = generate_diagram(
            State(h.state.clone()),
            Extension(h.session_id.clone()),
            Json(generate_body()),
        )
        .await
        .unwrap();
        assert!(generated.generated);
        assert!(generated.view.has_diagram);
        assert_eq!(h.pipeline.call_count(), 1);

        // Download serves the image.
        let response = download_diagram(
            State(h.state.clone()),
            Extension(h.session_id.clone()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/png"
        );

        // Workspace → Landing on logout.
        let view = logout(State(h.state.clone()), Extension(h.session_id.clone()))
            .await
            .unwrap();
        assert_eq!(view.view, ViewState::Landing);
        assert!(!view.has_diagram);
    }

    #[tokio::test]
    async fn test_generate_with_empty_text_calls_no_pipeline() {
        let h = harness();
        h.billing.set_active(true);

        login(
            State(h.state.clone()),
            Extension(h.session_id.clone()),
            Json(LoginRequest { email: "a@b.ch".into() }),
        )
        .await
        .unwrap();

        let mut body = generate_body();
        body.source_text = "   ".into();
        let (status, response) = generate_diagram(
            State(h.state.clone()),
            Extension(h.session_id.clone()),
            Json(body),
        )
        .await
        .unwrap_err();

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.code, "INVALID_INPUT");
        assert_eq!(h.pipeline.call_count(), 0);
    }

    #[tokio::test]
    async fn test_download_before_any_generation_is_404() {
        let h = harness();
        let response = download_diagram(
            State(h.state.clone()),
            Extension(h.session_id.clone()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
