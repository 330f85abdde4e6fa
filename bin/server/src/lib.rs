//! casbridge web server.
//!
//! Serves CAS single sign-on for multiple organizations, each with its own
//! CAS server, protocol version and membership policy.

pub mod app;
pub mod auth;
pub mod cas;
pub mod config;
pub mod db;
pub mod error;
pub mod pages;
pub mod settings;
