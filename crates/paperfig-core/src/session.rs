//! Session State
//!
//! Per-browser-session state: identity, subscription flags, and the last
//! generated diagram. State lives in process memory only; nothing survives
//! a restart.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::billing::SubscriptionCheck;
use crate::plan::PlanId;

/// Unique, opaque session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-session state
///
/// Invariant: `is_subscribed` implies `plan` and `valid_until` are present,
/// with `valid_until` in the future at the time of the last verification.
/// `apply_subscription` is the only place subscription fields are set and
/// it enforces this.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier (also the cookie value)
    pub id: SessionId,

    /// Email as submitted (trimmed), present once authenticated
    pub user_email: Option<String>,

    /// Derived user id: the case-normalized email
    pub user_id: Option<String>,

    /// Whether an active subscription was found at last verification
    pub is_subscribed: bool,

    /// Plan of the active subscription
    pub plan: Option<PlanId>,

    /// End of the current billing period at last verification
    pub valid_until: Option<DateTime<Utc>>,

    /// Plan the user started a checkout for (awaiting verification)
    pub pending_checkout_plan: Option<PlanId>,

    /// Path of the most recently generated diagram, for download
    pub last_diagram: Option<PathBuf>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last activity timestamp
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new, empty session
    pub fn new() -> Self {
        Self::with_id(SessionId::new())
    }

    /// Create with a specific ID
    pub fn with_id(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_email: None,
            user_id: None,
            is_subscribed: false,
            plan: None,
            valid_until: None,
            pending_checkout_plan: None,
            last_diagram: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the activity timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Whether an identity has been established
    pub fn is_authenticated(&self) -> bool {
        self.user_email.is_some()
    }

    /// Whether the session holds a subscription that is still within its
    /// billing period at `now`
    pub fn has_active_subscription(&self, now: DateTime<Utc>) -> bool {
        self.is_subscribed && self.valid_until.is_some_and(|until| until > now)
    }

    /// Store a subscription verification result
    ///
    /// A check that claims `active` without a recognized plan or with an
    /// already-elapsed period end is recorded as not subscribed.
    pub fn apply_subscription(&mut self, check: &SubscriptionCheck) {
        let now = Utc::now();
        match (check.active, check.plan, check.valid_until) {
            (true, Some(plan), Some(until)) if until > now => {
                self.is_subscribed = true;
                self.plan = Some(plan);
                self.valid_until = Some(until);
                self.pending_checkout_plan = None;
            }
            _ => {
                self.is_subscribed = false;
                self.plan = None;
                self.valid_until = None;
            }
        }
        self.touch();
    }

    /// Clear identity, subscription, and workspace fields
    ///
    /// Idempotent; clearing an already-clear session is a no-op.
    pub fn clear_identity(&mut self) {
        self.user_email = None;
        self.user_id = None;
        self.is_subscribed = false;
        self.plan = None;
        self.valid_until = None;
        self.pending_checkout_plan = None;
        self.last_diagram = None;
        self.touch();
    }

    /// Time since last activity
    pub fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        now - self.updated_at
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Session storage trait
///
/// Object-safe so the server can hold it behind a pointer; mutation is
/// load-modify-save, which keeps no lock held across await points.
pub trait SessionStore: Send + Sync {
    /// Save or update a session
    fn save(&self, session: &Session) -> crate::Result<()>;

    /// Load a session by ID
    fn load(&self, id: &SessionId) -> crate::Result<Option<Session>>;

    /// Remove a session
    fn remove(&self, id: &SessionId) -> crate::Result<()>;

    /// IDs of live sessions whose user id matches the normalized email
    fn find_by_email(&self, email: &str) -> crate::Result<Vec<SessionId>>;

    /// Drop sessions idle for longer than `max_idle`; returns how many
    fn purge_idle(&self, max_idle: Duration) -> crate::Result<usize>;
}

/// In-memory session store
pub struct MemorySessionStore {
    sessions: std::sync::RwLock<std::collections::HashMap<SessionId, Session>>,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: std::sync::RwLock::new(std::collections::HashMap::new()),
        }
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: &Session) -> crate::Result<()> {
        let mut sessions = self.sessions.write().unwrap();
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    fn load(&self, id: &SessionId) -> crate::Result<Option<Session>> {
        let sessions = self.sessions.read().unwrap();
        Ok(sessions.get(id).cloned())
    }

    fn remove(&self, id: &SessionId) -> crate::Result<()> {
        let mut sessions = self.sessions.write().unwrap();
        sessions.remove(id);
        Ok(())
    }

    fn find_by_email(&self, email: &str) -> crate::Result<Vec<SessionId>> {
        let normalized = email.trim().to_lowercase();
        let sessions = self.sessions.read().unwrap();
        Ok(sessions
            .values()
            .filter(|s| s.user_id.as_deref() == Some(normalized.as_str()))
            .map(|s| s.id.clone())
            .collect())
    }

    fn purge_idle(&self, max_idle: Duration) -> crate::Result<usize> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().unwrap();
        let before = sessions.len();
        sessions.retain(|_, s| s.idle_for(now) <= max_idle);
        Ok(before - sessions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_landing_shaped() {
        let session = Session::new();
        assert!(!session.is_authenticated());
        assert!(!session.is_subscribed);
        assert!(session.last_diagram.is_none());
    }

    #[test]
    fn test_apply_subscription_enforces_invariant() {
        let mut session = Session::new();

        // Active but missing a plan: recorded as not subscribed.
        session.apply_subscription(&SubscriptionCheck {
            active: true,
            plan: None,
            valid_until: Some(Utc::now() + Duration::days(30)),
        });
        assert!(!session.is_subscribed);
        assert!(session.plan.is_none());

        // Active but already elapsed: recorded as not subscribed.
        session.apply_subscription(&SubscriptionCheck {
            active: true,
            plan: Some(PlanId::Pro),
            valid_until: Some(Utc::now() - Duration::days(1)),
        });
        assert!(!session.is_subscribed);

        // Fully valid check.
        let until = Utc::now() + Duration::days(30);
        session.apply_subscription(&SubscriptionCheck::active(PlanId::Pro, until));
        assert!(session.is_subscribed);
        assert_eq!(session.plan, Some(PlanId::Pro));
        assert_eq!(session.valid_until, Some(until));
    }

    #[test]
    fn test_subscription_expiry() {
        let mut session = Session::new();
        let until = Utc::now() + Duration::seconds(60);
        session.apply_subscription(&SubscriptionCheck::active(PlanId::Pro, until));

        assert!(session.has_active_subscription(Utc::now()));
        assert!(!session.has_active_subscription(until + Duration::seconds(1)));
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemorySessionStore::new();
        let session = Session::new();
        let id = session.id.clone();

        store.save(&session).unwrap();
        assert!(store.load(&id).unwrap().is_some());

        store.remove(&id).unwrap();
        assert!(store.load(&id).unwrap().is_none());
    }

    #[test]
    fn test_find_by_email_is_case_insensitive() {
        let store = MemorySessionStore::new();
        let mut session = Session::new();
        session.user_email = Some("User@Example.com".into());
        session.user_id = Some("user@example.com".into());
        store.save(&session).unwrap();

        let found = store.find_by_email("USER@example.COM").unwrap();
        assert_eq!(found, vec![session.id.clone()]);
        assert!(store.find_by_email("other@example.com").unwrap().is_empty());
    }

    #[test]
    fn test_purge_idle() {
        let store = MemorySessionStore::new();
        let mut stale = Session::new();
        stale.updated_at = Utc::now() - Duration::hours(3);
        let fresh = Session::new();

        store.save(&stale).unwrap();
        store.save(&fresh).unwrap();

        let purged = store.purge_idle(Duration::hours(1)).unwrap();
        assert_eq!(purged, 1);
        assert!(store.load(&stale.id).unwrap().is_none());
        assert!(store.load(&fresh.id).unwrap().is_some());
    }
}
