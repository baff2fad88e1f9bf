//! Subscription plan identifiers
//!
//! The full plan catalog (display data, Stripe price ids) lives in
//! `paperfig-payments`; sessions and the view router only need the id.

use serde::{Deserialize, Serialize};

/// Subscription plan tiers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanId {
    Pro,
    Enterprise,
}

impl PlanId {
    /// All known plans, in display order
    pub const ALL: [PlanId; 2] = [PlanId::Pro, PlanId::Enterprise];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanId::Pro => "pro",
            PlanId::Enterprise => "enterprise",
        }
    }

    /// Parse a plan id; unknown names are rejected, not defaulted
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pro" => Some(PlanId::Pro),
            "enterprise" => Some(PlanId::Enterprise),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
