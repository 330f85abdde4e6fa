//! Logout route.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use tracing::info;

use super::{end_session, found};
use crate::app::{AppState, index_path};

/// Logs out by deleting the session, then redirects to the organization index.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Path(org_slug): Path<String>,
    jar: CookieJar,
) -> Response {
    let jar = end_session(&state, jar).await;
    info!(org = %org_slug, "logged out");
    (jar, found(&index_path(&org_slug))).into_response()
}
