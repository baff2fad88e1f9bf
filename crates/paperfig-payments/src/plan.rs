//! Plan Catalog
//!
//! Static plan display data joined with the Stripe price ids supplied by
//! configuration. Built once at startup and never mutated.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use paperfig_core::PlanId;

/// One sellable plan
#[derive(Clone, Debug, Serialize)]
pub struct SubscriptionPlan {
    /// Plan identifier
    pub id: PlanId,

    /// Name shown on plan cards
    pub display_name: String,

    /// Monthly price, for display
    pub monthly_price: Decimal,

    /// ISO currency code
    pub currency: String,

    /// Marketing feature list, in display order
    pub features: Vec<String>,

    /// Stripe price id actually billed; `None` means the plan cannot be
    /// checked out (kept off the wire)
    #[serde(skip_serializing)]
    pub price_id: Option<String>,
}

impl SubscriptionPlan {
    /// Monthly price in cents, as Stripe counts it
    pub fn monthly_price_cents(&self) -> i64 {
        (self.monthly_price * dec!(100))
            .trunc()
            .try_into()
            .unwrap_or(0)
    }
}

/// The immutable plan catalog
#[derive(Clone, Debug)]
pub struct PlanCatalog {
    plans: Vec<SubscriptionPlan>,
}

impl PlanCatalog {
    /// Build the catalog with the configured Stripe price ids
    pub fn new(pro_price_id: Option<String>, enterprise_price_id: Option<String>) -> Self {
        Self {
            plans: vec![
                SubscriptionPlan {
                    id: PlanId::Pro,
                    display_name: "Pro".into(),
                    monthly_price: dec!(19),
                    currency: "USD".into(),
                    features: vec![
                        "Unlimited method diagrams".into(),
                        "Methodology, flowchart and architecture styles".into(),
                        "Publication-ready PNG export".into(),
                    ],
                    price_id: pro_price_id,
                },
                SubscriptionPlan {
                    id: PlanId::Enterprise,
                    display_name: "Enterprise".into(),
                    monthly_price: dec!(79),
                    currency: "USD".into(),
                    features: vec![
                        "Everything in Pro".into(),
                        "Priority rendering queue".into(),
                        "Team workspaces".into(),
                        "Email support".into(),
                    ],
                    price_id: enterprise_price_id,
                },
            ],
        }
    }

    /// Look up a plan by id
    pub fn get(&self, id: PlanId) -> Option<&SubscriptionPlan> {
        self.plans.iter().find(|p| p.id == id)
    }

    /// Look up a plan by its Stripe price id
    pub fn by_price_id(&self, price_id: &str) -> Option<&SubscriptionPlan> {
        self.plans
            .iter()
            .find(|p| p.price_id.as_deref() == Some(price_id))
    }

    /// All plans, in display order
    pub fn plans(&self) -> &[SubscriptionPlan] {
        &self.plans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup() {
        let catalog = PlanCatalog::new(Some("price_pro".into()), Some("price_ent".into()));

        assert_eq!(catalog.get(PlanId::Pro).unwrap().price_id.as_deref(), Some("price_pro"));
        assert_eq!(catalog.by_price_id("price_ent").unwrap().id, PlanId::Enterprise);
        assert!(catalog.by_price_id("price_unknown").is_none());
    }

    #[test]
    fn test_unconfigured_plan_matches_no_price() {
        let catalog = PlanCatalog::new(Some("price_pro".into()), None);
        assert!(catalog.get(PlanId::Enterprise).unwrap().price_id.is_none());
        assert!(catalog.by_price_id("price_ent").is_none());
    }

    #[test]
    fn test_price_cents() {
        let catalog = PlanCatalog::new(None, None);
        assert_eq!(catalog.get(PlanId::Pro).unwrap().monthly_price_cents(), 1900);
        assert_eq!(
            catalog.get(PlanId::Enterprise).unwrap().monthly_price_cents(),
            7900
        );
    }
}
