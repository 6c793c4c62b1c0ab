//! HTTP surface for the controlled post-hoc edit workflow.
//!
//! Exposes config, state, error handling, auth, and routes so the binary
//! and the integration tests share them.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
