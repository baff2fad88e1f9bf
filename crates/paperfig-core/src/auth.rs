//! Auth Adapter
//!
//! Maps a submitted email to a session identity. The check is syntactic
//! only; no password, token, or provider-verified identity is involved.
//! Anything needing a real authentication mechanism replaces this module —
//! the rest of the system only sees the session fields it populates.

use tracing::warn;

use crate::billing::{SubscriptionCheck, SubscriptionLookup};
use crate::error::{CoreError, Result};
use crate::session::Session;

/// Syntactic email check: one `@` with a non-empty local part and a domain
/// containing a dot, no whitespace. Not a deliverability proof.
pub fn validate_email(email: &str) -> Result<&str> {
    let email = email.trim();
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return Err(CoreError::InvalidEmail);
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(CoreError::InvalidEmail);
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.contains('@') {
        return Err(CoreError::InvalidEmail);
    }
    Ok(email)
}

/// Establish an identity on the session, then verify its subscription.
///
/// On a failed email check the session is left untouched. A subscription
/// lookup error is recorded as *not subscribed* — verification failure
/// never grants access.
pub async fn authenticate<L>(session: &mut Session, email: &str, billing: &L) -> Result<()>
where
    L: SubscriptionLookup + ?Sized,
{
    let email = validate_email(email)?;
    session.user_email = Some(email.to_string());
    session.user_id = Some(email.to_lowercase());
    session.touch();

    match billing.check_subscription(email).await {
        Ok(check) => session.apply_subscription(&check),
        Err(e) => {
            warn!(email = %email, error = %e, "Subscription lookup failed; treating as not subscribed");
            session.apply_subscription(&SubscriptionCheck::inactive());
        }
    }

    Ok(())
}

/// Clear all identity and subscription state. Idempotent.
pub fn logout(session: &mut Session) {
    session.clear_identity();
}
