//! User (principal directory) models.

use inspecta_core::roles::Role;
use inspecta_core::store::{Principal, StoreError};
use inspecta_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::invalid_column;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a user. `password_hash` is an already-hashed PHC string.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    pub role: String,
}

impl TryFrom<User> for Principal {
    type Error = StoreError;

    fn try_from(user: User) -> Result<Self, Self::Error> {
        let role: Role = user
            .role
            .parse()
            .map_err(|e| invalid_column("users", "role", &user.role, e))?;
        Ok(Principal {
            id: user.id,
            display_name: user.display_name,
            role,
            secret_hash: user.password_hash,
            is_active: user.is_active,
        })
    }
}
