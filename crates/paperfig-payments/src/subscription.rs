//! Subscription Verification
//!
//! The `Billing` trait is the server's single seam to the payments
//! provider: checkout creation plus subscription lookup. `StripeBilling`
//! is the real implementation; `DemoBilling` is the explicitly-gated
//! sandbox that grants Pro without contacting Stripe.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use stripe::{
    Client, Customer, ListCustomers, ListSubscriptions, Subscription, SubscriptionStatus,
};
use tracing::{debug, warn};

use paperfig_core::{CoreError, PlanId, SubscriptionCheck, SubscriptionLookup};

use crate::checkout::{self, CheckoutRequest, CheckoutSession};
use crate::error::{BillingError, Result};
use crate::plan::PlanCatalog;

/// Payments provider seam
#[async_trait]
pub trait Billing: SubscriptionLookup {
    /// Create a hosted checkout session the user is redirected to
    async fn create_checkout_session(&self, request: CheckoutRequest)
        -> Result<CheckoutSession>;

    /// Implementation name, for logs and the health endpoint
    fn name(&self) -> &str;
}

/// Stripe-backed billing
pub struct StripeBilling {
    client: Client,
    catalog: Arc<PlanCatalog>,
}

impl StripeBilling {
    /// Create a new Stripe billing client
    pub fn new(secret_key: &str, catalog: Arc<PlanCatalog>) -> Self {
        Self {
            client: Client::new(secret_key),
            catalog,
        }
    }
}

#[async_trait]
impl SubscriptionLookup for StripeBilling {
    /// Look up the customer by email, then their most recent subscription.
    ///
    /// `active` only when Stripe reports the status as exactly `active`.
    /// Errors propagate; they are never softened into a grant.
    async fn check_subscription(
        &self,
        email: &str,
    ) -> paperfig_core::Result<SubscriptionCheck> {
        let mut params = ListCustomers::new();
        params.email = Some(email);
        params.limit = Some(1);

        let customers = Customer::list(&self.client, &params)
            .await
            .map_err(|e| CoreError::Provider(e.to_string()))?;
        let Some(customer) = customers.data.into_iter().next() else {
            debug!(email = %email, "No Stripe customer for email");
            return Ok(SubscriptionCheck::inactive());
        };

        let mut params = ListSubscriptions::new();
        params.customer = Some(customer.id.clone());
        params.limit = Some(1);

        let subscriptions = Subscription::list(&self.client, &params)
            .await
            .map_err(|e| CoreError::Provider(e.to_string()))?;
        let Some(subscription) = subscriptions.data.into_iter().next() else {
            return Ok(SubscriptionCheck::inactive());
        };

        if subscription.status != SubscriptionStatus::Active {
            debug!(
                customer = %customer.id,
                status = %subscription.status,
                "Subscription is not active"
            );
            return Ok(SubscriptionCheck::inactive());
        }

        let valid_until = DateTime::from_timestamp(subscription.current_period_end, 0);
        let plan = subscription
            .items
            .data
            .first()
            .and_then(|item| item.price.as_ref())
            .and_then(|price| self.catalog.by_price_id(price.id.as_str()))
            .map(|plan| plan.id);

        if plan.is_none() {
            warn!(
                customer = %customer.id,
                subscription = %subscription.id,
                "Active subscription bills an unrecognized price id"
            );
        }

        Ok(SubscriptionCheck {
            active: true,
            plan,
            valid_until,
        })
    }
}

#[async_trait]
impl Billing for StripeBilling {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession> {
        checkout::create_on_stripe(&self.client, &self.catalog, request).await
    }

    fn name(&self) -> &str {
        "Stripe"
    }
}

/// Demo billing: every identity holds a Pro subscription
///
/// Only wired in behind the explicit `PAPERFIG_DEMO` flag. Checkout skips
/// the hosted page entirely and "redirects" straight to the success URL.
pub struct DemoBilling {
    catalog: Arc<PlanCatalog>,
}

impl DemoBilling {
    pub fn new(catalog: Arc<PlanCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl SubscriptionLookup for DemoBilling {
    async fn check_subscription(
        &self,
        _email: &str,
    ) -> paperfig_core::Result<SubscriptionCheck> {
        Ok(SubscriptionCheck::active(
            PlanId::Pro,
            Utc::now() + Duration::days(30),
        ))
    }
}

#[async_trait]
impl Billing for DemoBilling {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession> {
        if self.catalog.get(request.plan).is_none() {
            return Err(BillingError::PlanNotConfigured(request.plan.to_string()));
        }
        Ok(CheckoutSession {
            id: format!("demo_{}", request.plan),
            checkout_url: request.success_url,
            plan: request.plan,
        })
    }

    fn name(&self) -> &str {
        "Demo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo() -> DemoBilling {
        DemoBilling::new(Arc::new(PlanCatalog::new(None, None)))
    }

    #[tokio::test]
    async fn test_demo_billing_grants_pro() {
        let check = demo().check_subscription("a@b.ch").await.unwrap();
        assert!(check.active);
        assert_eq!(check.plan, Some(PlanId::Pro));
        assert!(check.valid_until.unwrap() > Utc::now());
    }

    #[tokio::test]
    async fn test_demo_checkout_skips_hosted_page() {
        let session = demo()
            .create_checkout_session(CheckoutRequest {
                plan: PlanId::Pro,
                customer_email: Some("a@b.ch".into()),
                success_url: "https://paperfig.example/workspace?checkout=success".into(),
                cancel_url: "https://paperfig.example/pricing".into(),
            })
            .await
            .unwrap();
        assert_eq!(
            session.checkout_url,
            "https://paperfig.example/workspace?checkout=success"
        );
    }
}
