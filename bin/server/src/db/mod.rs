//! Database repositories for casbridge.
//!
//! This module binds the storage traits of `casbridge-access` to Postgres:
//! - Organizations and their settings
//! - Users
//! - Browser sessions

pub mod organization;
pub mod session;
pub mod user;

use casbridge_access::StoreError;

pub use organization::OrganizationRepository;
pub use session::SessionRepository;
pub use user::UserRepository;

fn backend_error(e: sqlx::Error) -> StoreError {
    StoreError::Backend {
        details: e.to_string(),
    }
}
