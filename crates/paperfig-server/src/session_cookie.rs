//! Cookie-Backed Session Resolution
//!
//! A small middleware that maps the session cookie to a live session,
//! creating one on first contact. Handlers pick up the `SessionId` from
//! request extensions.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::error;

use paperfig_core::{Session, SessionId, SessionStore};

use crate::state::AppState;

pub const SESSION_COOKIE: &str = "paperfig_session";

/// Pull the session id out of the Cookie header, if present
pub fn session_id_from_headers(headers: &axum::http::HeaderMap) -> Option<SessionId> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty())
            .then(|| SessionId::from_string(value))
    })
}

/// Set-Cookie value for a session id
pub fn set_cookie_value(id: &SessionId) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

/// Resolve or create the session for this request
///
/// A cookie pointing at a purged session is treated like no cookie at all.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = session_id_from_headers(request.headers())
        .and_then(|id| state.sessions.load(&id).ok().flatten())
        .map(|session| session.id);

    let (session_id, is_new) = match existing {
        Some(id) => (id, false),
        None => {
            let session = Session::new();
            if let Err(e) = state.sessions.save(&session) {
                error!(error = %e, "Failed to create session");
            }
            (session.id, true)
        }
    };

    request.extensions_mut().insert(session_id.clone());
    let mut response = next.run(request).await;

    if is_new {
        if let Ok(value) = HeaderValue::from_str(&set_cookie_value(&session_id)) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    #[test]
    fn test_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; paperfig_session=abc-123; lang=en"),
        );
        assert_eq!(
            session_id_from_headers(&headers),
            Some(SessionId::from_string("abc-123"))
        );
    }

    #[test]
    fn test_missing_or_empty_cookie() {
        let headers = HeaderMap::new();
        assert_eq!(session_id_from_headers(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("paperfig_session="));
        assert_eq!(session_id_from_headers(&headers), None);
    }

    #[test]
    fn test_set_cookie_value() {
        let id = SessionId::from_string("abc-123");
        let value = set_cookie_value(&id);
        assert!(value.starts_with("paperfig_session=abc-123;"));
        assert!(value.contains("HttpOnly"));
    }
}
