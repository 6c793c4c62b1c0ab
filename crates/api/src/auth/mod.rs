//! Authentication primitives.
//!
//! - [`jwt`] -- access-token generation and validation (principal resolution).
//! - [`password`] -- Argon2id hashing and the supervisor credential verifier.

pub mod jwt;
pub mod password;
