//! CAS login and callback routes.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use casbridge_access::{Session, SessionId, provision_user, sanitize_next_path};
use casbridge_cas::{ServiceTicket, TicketValidation};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use super::cas_organization;
use crate::app::{AppState, index_path, login_path};
use crate::auth::{end_session, found, load_or_start_session, session_cookie};

pub const NO_TICKET_MESSAGE: &str = "CAS authentication failed. No ticket provided.";
pub const TRY_AGAIN_MESSAGE: &str = "CAS authentication failed. Please try again.";
pub const INVALID_TICKET_MESSAGE: &str = "CAS authentication failed. Invalid ticket.";
pub const NOT_ALLOWED_MESSAGE: &str = "Your CAS account isn't allowed.";

/// Query parameters for CAS login initiation.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    next: Option<String>,
}

/// Query parameters for the CAS callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    ticket: Option<String>,
}

/// Starts a CAS login by redirecting to the organization's CAS server.
///
/// The requested `next` destination is kept in the session until the
/// callback. Organizations that cannot serve a CAS login are sent to their
/// index, whatever the reason.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Path(org_slug): Path<String>,
    Query(query): Query<LoginQuery>,
    jar: CookieJar,
) -> Response {
    let index = index_path(&org_slug);
    let Some((_, client)) = cas_organization(&state, &org_slug).await else {
        return found(&index);
    };

    let mut session = match load_or_start_session(&state, &jar).await {
        Ok(session) => session,
        Err(e) => {
            error!(org = %org_slug, error = %e, "failed to load session");
            return found(&index);
        }
    };

    let next = query
        .next
        .filter(|next| !next.trim().is_empty())
        .unwrap_or_else(|| index.clone());
    session.set_next_url(next);

    if let Err(e) = state.sessions.save(&session).await {
        error!(org = %org_slug, error = %e, "failed to save session");
        return found(&index);
    }

    debug!(org = %org_slug, "redirecting to CAS server");
    let jar = jar.add(session_cookie(&session, state.session_config.secure_cookies));
    (jar, found(&client.login_url())).into_response()
}

/// Completes a CAS login.
///
/// Every failure ends in a redirect: to the login page with a flash message
/// for ticket and authorization failures, or through a forced logout to the
/// index when the user cannot be provisioned.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Path(org_slug): Path<String>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Response {
    let index = index_path(&org_slug);
    let Some((org, client)) = cas_organization(&state, &org_slug).await else {
        return found(&index);
    };

    let mut session = match load_or_start_session(&state, &jar).await {
        Ok(session) => session,
        Err(e) => {
            error!(org = %org_slug, error = %e, "failed to load session");
            Session::anonymous(
                SessionId::generate(),
                state.session_config.anonymous_duration(),
            )
        }
    };

    let ticket = match query.ticket.map(ServiceTicket::new) {
        Some(Ok(ticket)) => ticket,
        Some(Err(_)) | None => {
            error!(org = %org_slug, "CAS callback without a ticket");
            return fail(&state, jar, session, &org_slug, NO_TICKET_MESSAGE).await;
        }
    };

    let assertion = match client.verify_ticket(&ticket).await {
        Ok(TicketValidation::Valid(assertion)) if !assertion.principal().trim().is_empty() => {
            assertion
        }
        Ok(TicketValidation::Valid(_)) => {
            error!(org = %org_slug, "CAS ticket validated without a principal");
            return fail(&state, jar, session, &org_slug, INVALID_TICKET_MESSAGE).await;
        }
        Ok(TicketValidation::Invalid { code, message }) => {
            error!(org = %org_slug, code = %code, message = %message, "CAS ticket rejected");
            return fail(&state, jar, session, &org_slug, INVALID_TICKET_MESSAGE).await;
        }
        Err(e) => {
            error!(org = %org_slug, error = %e, "CAS ticket validation failed");
            return fail(&state, jar, session, &org_slug, TRY_AGAIN_MESSAGE).await;
        }
    };
    let username = assertion.principal();

    if !state
        .policy
        .verify(&org, username, state.users.as_ref())
        .await
    {
        warn!(org = %org_slug, username = %username, "CAS user is not allowed to log in");
        return fail(&state, jar, session, &org_slug, NOT_ALLOWED_MESSAGE).await;
    }

    let display_name = assertion
        .attributes()
        .first("displayName")
        .unwrap_or(username);

    let user = match provision_user(state.users.as_ref(), &org, display_name, username).await {
        Ok(user) => user,
        Err(e) => {
            error!(org = %org_slug, username = %username, error = %e, "failed to log in CAS user");
            let jar = end_session(&state, jar).await;
            return (jar, found(&index)).into_response();
        }
    };

    info!(
        org = %org_slug,
        username = %username,
        attributes = %assertion.attributes(),
        pgt_iou = ?assertion.proxy_granting_ticket_iou(),
        "CAS login succeeded"
    );

    // The pending redirect stays on the old session until the new one is saved.
    let target = sanitize_next_path(session.next_url().unwrap_or(&index), &index);

    let logged_in = session.authenticated(user.id(), state.session_config.duration());
    if let Err(e) = state.sessions.save(&logged_in).await {
        error!(org = %org_slug, error = %e, "failed to save logged-in session");
        return fail(&state, jar, session, &org_slug, TRY_AGAIN_MESSAGE).await;
    }
    if let Err(e) = state.sessions.delete(session.id()).await {
        warn!(org = %org_slug, error = %e, "failed to delete pre-login session");
    }

    let jar = jar.add(session_cookie(
        &logged_in,
        state.session_config.secure_cookies,
    ));
    (jar, found(&target)).into_response()
}

/// Flashes `message` and redirects to the login page.
async fn fail(
    state: &AppState,
    jar: CookieJar,
    mut session: Session,
    org_slug: &str,
    message: &str,
) -> Response {
    session.push_flash(message);
    let jar = match state.sessions.save(&session).await {
        Ok(()) => jar.add(session_cookie(&session, state.session_config.secure_cookies)),
        Err(e) => {
            error!(org = %org_slug, error = %e, "failed to save session");
            jar
        }
    };
    (jar, found(&login_path(org_slug))).into_response()
}
