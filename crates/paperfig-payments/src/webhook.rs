//! Stripe Webhook Handling
//!
//! Subscription lifecycle push-updates. Signature verification uses
//! Stripe's own scheme via `Webhook::construct_event`; parsed events carry
//! just enough for the server to refresh matching live sessions. There is
//! no durable subscription store, so events that cannot be tied to a
//! customer email are logged and dropped.

use stripe::{Event, EventObject, EventType, Webhook};
use tracing::debug;

use paperfig_core::PlanId;

use crate::error::{BillingError, Result};

/// Parsed webhook event
#[derive(Clone, Debug)]
pub enum SubscriptionEvent {
    /// Checkout completed; the subscription should now verify as active
    CheckoutCompleted {
        session_id: String,
        customer_email: Option<String>,
        plan: Option<PlanId>,
    },

    /// Subscription status changed
    SubscriptionUpdated {
        subscription_id: String,
        status: String,
    },

    /// Subscription cancelled
    SubscriptionCancelled { subscription_id: String },

    /// A renewal payment failed
    PaymentFailed { customer_email: Option<String> },

    /// Unhandled event type
    Other { event_type: String },
}

impl SubscriptionEvent {
    /// Customer email, when the event carries one
    pub fn customer_email(&self) -> Option<&str> {
        match self {
            SubscriptionEvent::CheckoutCompleted { customer_email, .. }
            | SubscriptionEvent::PaymentFailed { customer_email } => customer_email.as_deref(),
            _ => None,
        }
    }
}

/// Verifies webhook signatures and parses events
pub struct WebhookVerifier {
    secret: String,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verify the signature and parse the payload
    pub fn parse(&self, payload: &str, signature: &str) -> Result<SubscriptionEvent> {
        let event = Webhook::construct_event(payload, signature, &self.secret)
            .map_err(|e| BillingError::WebhookSignature(e.to_string()))?;
        convert(&event)
    }
}

fn convert(event: &Event) -> Result<SubscriptionEvent> {
    match event.type_ {
        EventType::CheckoutSessionCompleted => {
            if let EventObject::CheckoutSession(session) = &event.data.object {
                let plan = session
                    .metadata
                    .as_ref()
                    .and_then(|m| m.get("plan"))
                    .and_then(|p| PlanId::parse(p));

                Ok(SubscriptionEvent::CheckoutCompleted {
                    session_id: session.id.to_string(),
                    customer_email: session.customer_email.clone(),
                    plan,
                })
            } else {
                Err(BillingError::WebhookParse(
                    "Invalid checkout session data".into(),
                ))
            }
        }

        EventType::CustomerSubscriptionUpdated => {
            if let EventObject::Subscription(subscription) = &event.data.object {
                Ok(SubscriptionEvent::SubscriptionUpdated {
                    subscription_id: subscription.id.to_string(),
                    status: subscription.status.to_string(),
                })
            } else {
                Err(BillingError::WebhookParse("Invalid subscription data".into()))
            }
        }

        EventType::CustomerSubscriptionDeleted => {
            if let EventObject::Subscription(subscription) = &event.data.object {
                Ok(SubscriptionEvent::SubscriptionCancelled {
                    subscription_id: subscription.id.to_string(),
                })
            } else {
                Err(BillingError::WebhookParse("Invalid subscription data".into()))
            }
        }

        EventType::InvoicePaymentFailed => {
            if let EventObject::Invoice(invoice) = &event.data.object {
                Ok(SubscriptionEvent::PaymentFailed {
                    customer_email: invoice.customer_email.clone(),
                })
            } else {
                Err(BillingError::WebhookParse("Invalid invoice data".into()))
            }
        }

        _ => {
            debug!(event_type = ?event.type_, "Unhandled webhook event");
            Ok(SubscriptionEvent::Other {
                event_type: format!("{:?}", event.type_),
            })
        }
    }
}
