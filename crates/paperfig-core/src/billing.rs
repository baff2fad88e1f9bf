//! Billing Abstraction
//!
//! Defines the subscription-lookup seam the auth adapter talks through.
//! Concrete implementations (Stripe, demo) live in `paperfig-payments`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::plan::PlanId;

/// Outcome of a subscription lookup for one customer email
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubscriptionCheck {
    /// True only when the provider reports the subscription as `active`
    pub active: bool,

    /// Plan the active subscription maps to
    pub plan: Option<PlanId>,

    /// End of the current billing period
    pub valid_until: Option<DateTime<Utc>>,
}

impl SubscriptionCheck {
    /// No active subscription (also the result for unknown customers)
    pub fn inactive() -> Self {
        Self {
            active: false,
            plan: None,
            valid_until: None,
        }
    }

    /// An active subscription on the given plan
    pub fn active(plan: PlanId, valid_until: DateTime<Utc>) -> Self {
        Self {
            active: true,
            plan: Some(plan),
            valid_until: Some(valid_until),
        }
    }
}

/// Strategy trait for subscription verification
///
/// A lookup error means "could not verify", never "verified". Callers must
/// treat `Err` as not subscribed; access is never granted on failure.
#[async_trait]
pub trait SubscriptionLookup: Send + Sync {
    /// Look up the most recent subscription for a customer email
    async fn check_subscription(&self, email: &str) -> Result<SubscriptionCheck>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_carries_no_plan() {
        let check = SubscriptionCheck::inactive();
        assert!(!check.active);
        assert!(check.plan.is_none());
        assert!(check.valid_until.is_none());
    }
}
