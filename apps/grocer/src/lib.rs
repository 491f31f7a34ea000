//! # Grocer Application Library
//!
//! HTTP API and configuration for the Grocer binary, exposed as a library so
//! integration tests can drive the router directly.

pub mod api;
pub mod config;
