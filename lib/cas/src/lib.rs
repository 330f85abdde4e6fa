//! Central Authentication Service (CAS) protocol client.
//!
//! This crate provides:
//! - Protocol versions 1, 2 and 3 (`ProtocolVersion`)
//! - Per-tenant client configuration and URL construction (`CasClientConfig`)
//! - Service ticket validation over HTTP (`CasClient`, `HttpCasClient`)
//! - Parsing of `validate` and `serviceValidate` responses
//!
//! A client is bound to exactly one CAS server and one service (callback)
//! URL. Clients are cheap to build and are meant to be constructed for every
//! request, since tenant settings may change between requests.
//!
//! # Example
//!
//! ```
//! use casbridge_cas::{CasClientConfig, ProtocolVersion};
//!
//! let config = CasClientConfig::new(
//!     ProtocolVersion::V2,
//!     "https://cas.acme.example",
//!     "https://app.example.com/acme/cas/callback",
//! )
//! .expect("valid urls");
//!
//! let login = config.login_url();
//! assert!(login.as_str().starts_with("https://cas.acme.example/login?service="));
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod response;
pub mod ticket;
pub mod version;

pub use client::{CasClient, CasClientFactory, HttpCasClient, HttpCasClientFactory};
pub use config::CasClientConfig;
pub use error::CasError;
pub use ticket::{Assertion, Attributes, ServiceTicket, TicketValidation};
pub use version::ProtocolVersion;
