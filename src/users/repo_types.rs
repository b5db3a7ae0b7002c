use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct User {
    pub id: i64,                      // store-assigned
    pub username: String,             // unique
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,        // Argon2 PHC string, not exposed in JSON
    #[serde(skip_serializing)]
    pub auth_token: String,           // currently valid token
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Insert projection for `UserStore::add`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub auth_token: String,
}
