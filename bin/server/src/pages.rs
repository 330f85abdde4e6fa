//! Server-rendered pages.

mod views;

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use tracing::{error, warn};

use crate::app::{AppState, login_path};
use crate::auth::{RequireAuth, found, load_session};

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginPageQuery {
    next: Option<String>,
}

/// Renders the login page.
///
/// Pending flash messages are shown once and consumed. The CAS link is only
/// offered when the organization exists and has CAS enabled.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Path(org_slug): Path<String>,
    Query(query): Query<LoginPageQuery>,
    jar: CookieJar,
) -> Response {
    let flashes = match load_session(&state, &jar).await {
        Ok(Some(mut session)) => {
            let flashes = session.take_flashes();
            if !flashes.is_empty() {
                if let Err(e) = state.sessions.save(&session).await {
                    warn!(org = %org_slug, error = %e, "failed to consume flash messages");
                }
            }
            flashes
        }
        Ok(None) => Vec::new(),
        Err(e) => {
            error!(org = %org_slug, error = %e, "failed to load session");
            Vec::new()
        }
    };

    let cas_enabled = match state.organizations.find_by_slug(&org_slug).await {
        Ok(org) => org.is_some_and(|org| org.cas_enabled()),
        Err(e) => {
            error!(org = %org_slug, error = %e, "failed to load organization");
            false
        }
    };

    let cas_link = cas_enabled.then(|| cas_login_href(&org_slug, query.next.as_deref()));
    Html(views::login_html(flashes, cas_link)).into_response()
}

/// Renders the organization index for its signed-in users.
pub async fn index(
    State(state): State<Arc<AppState>>,
    Path(org_slug): Path<String>,
    RequireAuth(current): RequireAuth,
) -> Response {
    let org = match state.organizations.find_by_slug(&org_slug).await {
        Ok(org) => org,
        Err(e) => {
            error!(org = %org_slug, error = %e, "failed to load organization");
            None
        }
    };

    match org {
        Some(org) if org.id() == current.user.org_id() => Html(views::index_html(
            org.name().to_string(),
            current.user.name().to_string(),
            format!("/{}/logout", org.slug()),
        ))
        .into_response(),
        _ => found(&login_path(&org_slug)),
    }
}

fn cas_login_href(org_slug: &str, next: Option<&str>) -> String {
    let mut href = format!("/{org_slug}/cas/login");
    if let Some(next) = next.filter(|next| !next.is_empty()) {
        href.push_str("?next=");
        href.extend(url::form_urlencoded::byte_serialize(next.as_bytes()));
    }
    href
}
