//! # paperfig-payments
//!
//! Billing for paperfig via Stripe's hosted checkout.
//!
//! **Flow:** Paywall → Redirect to Stripe's hosted page → Redirect back
//!
//! ```text
//! ┌─────────────┐     ┌─────────────────┐     ┌─────────────┐
//! │   Paywall   │────▶│  Stripe Hosted  │────▶│  Workspace  │
//! │ (plan cards)│     │  Checkout Page  │     │ (verified)  │
//! └─────────────┘     └─────────────────┘     └─────────────┘
//! ```
//!
//! The hosted approach keeps all payment collection on Stripe's side; this
//! crate only creates checkout sessions against configured price ids and
//! verifies subscription status by customer email.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use paperfig_payments::{Billing, CheckoutRequest, PlanCatalog, StripeBilling};
//! use paperfig_core::PlanId;
//!
//! let catalog = PlanCatalog::new(Some("price_xxx".into()), None);
//! let billing = StripeBilling::new("sk_test_xxx", catalog.into());
//!
//! let session = billing.create_checkout_session(CheckoutRequest {
//!     plan: PlanId::Pro,
//!     customer_email: Some("user@example.com".into()),
//!     success_url: "https://yoursite.com/workspace?checkout=success".into(),
//!     cancel_url: "https://yoursite.com/pricing".into(),
//! }).await?;
//!
//! // Redirect user to: session.checkout_url
//! ```
//!
//! Lookup-failure policy: `check_subscription` errors are surfaced to the
//! caller and always mean *no access*. The only way to bypass Stripe is the
//! explicit demo implementation, [`DemoBilling`].

mod checkout;
mod error;
mod plan;
mod subscription;
mod webhook;

pub use checkout::{CheckoutRequest, CheckoutSession};
pub use error::{BillingError, Result};
pub use plan::{PlanCatalog, SubscriptionPlan};
pub use subscription::{Billing, DemoBilling, StripeBilling};
pub use webhook::{SubscriptionEvent, WebhookVerifier};
