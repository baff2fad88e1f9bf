//! View Router
//!
//! The three mutually exclusive views are a pure function of session state.
//! Each user action declares the views it is available in; invoking an
//! action from any other view is a no-op, never an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::Session;

/// The view to render for a session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewState {
    /// No identity: product page with the login form
    Landing,

    /// Identity without an active subscription: plan cards
    Paywall,

    /// Identity with an active subscription: the diagram studio
    Workspace,
}

impl ViewState {
    /// Compute the view for a session
    ///
    /// A subscription whose `valid_until` has elapsed by `now` routes back
    /// to the paywall — this is the expiry transition; the stored flags are
    /// corrected on the next verification.
    pub fn for_session(session: &Session, now: DateTime<Utc>) -> Self {
        if !session.is_authenticated() {
            ViewState::Landing
        } else if session.has_active_subscription(now) {
            ViewState::Workspace
        } else {
            ViewState::Paywall
        }
    }

    /// Whether `action` may run in this view
    pub fn allows(&self, action: Action) -> bool {
        match self {
            ViewState::Landing => matches!(action, Action::Login),
            ViewState::Paywall => matches!(
                action,
                Action::Logout | Action::Subscribe | Action::RefreshSubscription
            ),
            ViewState::Workspace => matches!(
                action,
                Action::Logout
                    | Action::RefreshSubscription
                    | Action::Generate
                    | Action::Download
            ),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewState::Landing => "landing",
            ViewState::Paywall => "paywall",
            ViewState::Workspace => "workspace",
        }
    }
}

impl std::fmt::Display for ViewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User actions the server exposes as routes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Login,
    Logout,
    Subscribe,
    RefreshSubscription,
    Generate,
    Download,
}
