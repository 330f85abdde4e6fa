//! Core types shared by every casbridge crate.
//!
//! This crate provides the typed identifiers for tenants and users and the
//! `Result` alias used for layered error reporting.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{OrgId, ParseIdError, UserId};
