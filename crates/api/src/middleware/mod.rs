//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Resolves the principal from a JWT Bearer token.
//! - [`rbac::RequireSupervisor`] -- Requires the `supervisor` role.

pub mod auth;
pub mod rbac;
