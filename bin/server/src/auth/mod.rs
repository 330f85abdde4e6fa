//! Browser session transport and authentication extractors.
//!
//! The browser holds only an opaque session ID in the `session` cookie. The
//! session itself (pending post-login redirect, flash messages, logged-in
//! user) lives server-side in the [`SessionStore`](casbridge_access::SessionStore).

pub mod middleware;
pub mod routes;

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use casbridge_access::{Session, SessionId, StoreError};
use chrono::Utc;
use rootcause::prelude::Report;
use time::Duration as TimeDuration;
use tracing::warn;

use crate::app::AppState;

pub use middleware::{AuthRejection, CurrentUser, RequireAdmin, RequireAuth};
pub use routes::logout;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "session";

/// Builds the cookie that carries `session` to the browser.
#[must_use]
pub fn session_cookie(session: &Session, secure: bool) -> Cookie<'static> {
    let remaining = (session.expires_at() - Utc::now()).num_seconds().max(0);
    Cookie::build((SESSION_COOKIE, session.id().as_str().to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::seconds(remaining))
        .build()
}

/// Builds a cookie that clears the session cookie.
#[must_use]
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(TimeDuration::ZERO)
        .build()
}

/// Returns the session ID named by the request's cookie, if any.
#[must_use]
pub fn session_id(jar: &CookieJar) -> Option<SessionId> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().trim())
        .filter(|value| !value.is_empty())
        .map(SessionId::from)
}

/// Loads the live session named by the request's cookie.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_session(
    state: &AppState,
    jar: &CookieJar,
) -> Result<Option<Session>, Report<StoreError>> {
    match session_id(jar) {
        Some(id) => state.sessions.find_by_id(&id).await,
        None => Ok(None),
    }
}

/// Loads the request's session, or starts a new anonymous one.
///
/// A new session is not stored until the caller saves it.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_or_start_session(
    state: &AppState,
    jar: &CookieJar,
) -> Result<Session, Report<StoreError>> {
    Ok(load_session(state, jar).await?.unwrap_or_else(|| {
        Session::anonymous(
            SessionId::generate(),
            state.session_config.anonymous_duration(),
        )
    }))
}

/// Deletes the request's session and clears its cookie.
pub async fn end_session(state: &AppState, jar: CookieJar) -> CookieJar {
    if let Some(id) = session_id(&jar) {
        if let Err(e) = state.sessions.delete(&id).await {
            warn!(error = %e, "failed to delete session");
        }
    }
    jar.add(removal_cookie())
}

/// Answers with `302 Found` pointing at `location`.
#[must_use]
pub fn found(location: &str) -> Response {
    let location = HeaderValue::try_from(location).unwrap_or_else(|_| {
        warn!(location = ?location, "invalid redirect location, redirecting to /");
        HeaderValue::from_static("/")
    });
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}
