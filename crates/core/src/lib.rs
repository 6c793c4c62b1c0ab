//! Domain core for the controlled post-hoc edit workflow on QC inspection
//! records: edit leases, the edit policy engine, the photo invariant, the
//! edit-request workflow, and the append-only audit history.
//!
//! Nothing here touches a database or HTTP. Storage is reached through the
//! traits in [`store`]; [`service::EditService`] runs every operation.

pub mod clock;
pub mod edit_request;
pub mod error;
pub mod hashing;
pub mod history;
pub mod lease;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod photo;
pub mod policy;
pub mod roles;
pub mod service;
pub mod store;
pub mod types;
