//! Tenants, users, sessions and login authorization for casbridge.
//!
//! This crate provides:
//! - Organizations and their settings (`Organization`, `OrgSettings`, `CasSettings`)
//! - Users and just-in-time provisioning (`User`, `provision_user`)
//! - Browser sessions carrying the pending post-login redirect (`Session`)
//! - The login authorization policy (`AuthorizationPolicy`, `UnknownUserPolicy`)
//! - The redirect-safety resolver (`sanitize_next_path`)
//! - Storage traits with in-memory implementations
//!
//! # Example
//!
//! ```
//! use casbridge_access::{Organization, OrgSettings, sanitize_next_path};
//!
//! let mut settings = OrgSettings::new();
//! settings.set_setting("auth_cas_enabled", true);
//! settings.set_setting("auth_cas_server_url", "https://cas.acme.example");
//!
//! let org = Organization::new("acme", "Acme Corp").with_settings(settings);
//! assert!(org.cas_enabled());
//!
//! let next = sanitize_next_path("https://evil.example/dashboards/7", "/acme/");
//! assert_eq!(next, "/dashboards/7");
//! ```

pub mod error;
pub mod memory;
pub mod org;
pub mod policy;
pub mod provision;
pub mod redirect;
pub mod session;
pub mod store;
pub mod user;

pub use error::{ProvisioningError, SettingsError, StoreError};
pub use org::{CasSettings, OrgSettings, Organization, settings_keys};
pub use policy::{AccessDecision, AuthorizationPolicy, MembershipDirectory, UnknownUserPolicy};
pub use provision::provision_user;
pub use redirect::sanitize_next_path;
pub use session::{Session, SessionId};
pub use store::{OrganizationStore, SessionStore, UserStore};
pub use user::User;
