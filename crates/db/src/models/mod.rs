//! Row structs and DTOs.
//!
//! Each submodule holds a `FromRow` struct matching the table and, where the
//! core has a domain type for the same data, a conversion into it.

pub mod edit_request;
pub mod history_edit;
pub mod photo;
pub mod record;
pub mod user;

use inspecta_core::store::StoreError;

/// A stored enum column held a value the domain does not know.
pub(crate) fn invalid_column(table: &str, column: &str, value: &str, reason: String) -> StoreError {
    StoreError::new(format!(
        "{table}.{column} holds invalid value '{value}': {reason}"
    ))
}
