//! Billing Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, BillingError>;

/// Billing-related errors
#[derive(Error, Debug)]
pub enum BillingError {
    /// Plan is unknown or has no Stripe price id configured
    #[error("Plan not configured: {0}")]
    PlanNotConfigured(String),

    /// Stripe rejected the payment method
    #[error("Payment declined: {0}")]
    PaymentDeclined(String),

    /// Any other Stripe API error
    #[error("Stripe error: {0}")]
    Provider(String),

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    WebhookSignature(String),

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BillingError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, BillingError::Provider(_))
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            BillingError::PlanNotConfigured(_) => {
                "This plan is not available right now.".into()
            }
            BillingError::PaymentDeclined(msg) => msg.clone(),
            BillingError::Provider(_) => {
                "Payment processing failed. Please try again.".into()
            }
            BillingError::Config(_) => "Service configuration error.".into(),
            _ => "An error occurred processing your request.".into(),
        }
    }
}
