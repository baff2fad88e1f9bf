//! Stripe Checkout
//!
//! Creates hosted checkout sessions against the configured price ids.

use serde::{Deserialize, Serialize};
use stripe::{
    CheckoutSession as StripeCheckoutSession, CheckoutSessionMode, Client,
    CreateCheckoutSession, CreateCheckoutSessionLineItems,
};

use paperfig_core::PlanId;

use crate::error::{BillingError, Result};
use crate::plan::PlanCatalog;

/// Request to create a checkout session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Plan to purchase
    pub plan: PlanId,

    /// Customer email, prefilled on the hosted page when known
    #[serde(default)]
    pub customer_email: Option<String>,

    /// URL to redirect after successful payment
    pub success_url: String,

    /// URL to redirect if checkout is cancelled
    pub cancel_url: String,
}

/// Result of creating a checkout session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider session ID
    pub id: String,

    /// URL to redirect user to
    pub checkout_url: String,

    /// Plan being purchased
    pub plan: PlanId,
}

/// Create a hosted checkout session for a configured plan
pub(crate) async fn create_on_stripe(
    client: &Client,
    catalog: &PlanCatalog,
    request: CheckoutRequest,
) -> Result<CheckoutSession> {
    let plan = catalog
        .get(request.plan)
        .ok_or_else(|| BillingError::PlanNotConfigured(request.plan.to_string()))?;
    let price_id = plan
        .price_id
        .clone()
        .ok_or_else(|| BillingError::PlanNotConfigured(request.plan.to_string()))?;

    let mut params = CreateCheckoutSession::new();
    params.customer_email = request.customer_email.as_deref();
    params.success_url = Some(&request.success_url);
    params.cancel_url = Some(&request.cancel_url);
    params.mode = Some(CheckoutSessionMode::Subscription);

    // Metadata lets the webhook side resolve plan and customer
    let mut metadata = std::collections::HashMap::new();
    metadata.insert("plan".to_string(), request.plan.to_string());
    params.metadata = Some(metadata);

    params.line_items = Some(vec![CreateCheckoutSessionLineItems {
        quantity: Some(1),
        price: Some(price_id),
        ..Default::default()
    }]);

    let session = StripeCheckoutSession::create(client, params)
        .await
        .map_err(map_stripe_error)?;

    let checkout_url = session
        .url
        .ok_or_else(|| BillingError::Provider("No checkout URL returned".into()))?;

    Ok(CheckoutSession {
        id: session.id.to_string(),
        checkout_url,
        plan: request.plan,
    })
}

/// Map Stripe errors onto the billing taxonomy; card rejections carry
/// Stripe's own user-facing message
pub(crate) fn map_stripe_error(err: stripe::StripeError) -> BillingError {
    if let stripe::StripeError::Stripe(request_error) = &err {
        let declined = request_error.error_type == stripe::ErrorType::Card
            || request_error.code == Some(stripe::ErrorCode::CardDeclined);
        if declined {
            return BillingError::PaymentDeclined(
                request_error
                    .message
                    .clone()
                    .unwrap_or_else(|| "Your payment method was declined.".into()),
            );
        }
    }
    BillingError::Provider(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_plan_fails_before_any_call() {
        // Enterprise has no price id: the catalog check fires before the
        // client is ever used, so a dummy key is fine here.
        let client = Client::new("sk_test_dummy");
        let catalog = PlanCatalog::new(Some("price_pro_123".into()), None);

        let err = create_on_stripe(
            &client,
            &catalog,
            CheckoutRequest {
                plan: PlanId::Enterprise,
                customer_email: None,
                success_url: "https://paperfig.example/workspace".into(),
                cancel_url: "https://paperfig.example/pricing".into(),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, BillingError::PlanNotConfigured(_)));
    }
}
