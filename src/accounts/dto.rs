use serde::{Deserialize, Serialize};

use crate::users::User;

/// Request body for `POST /api/account`.
///
/// Fields are optional at the wire level so a missing field becomes a
/// validation message rather than a deserialization failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    #[serde(default, alias = "Username")]
    pub username: Option<String>,
    #[serde(default, alias = "Email")]
    pub email: Option<String>,
    #[serde(default, alias = "Password")]
    pub password: Option<String>,
}

/// Request body for `PUT /api/account/{id}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[serde(default, alias = "Username")]
    pub username: Option<String>,
    #[serde(default, alias = "Email")]
    pub email: Option<String>,
    #[serde(default, alias = "CurrentPassword")]
    pub current_password: Option<String>,
    #[serde(default, alias = "NewPassword")]
    pub new_password: Option<String>,
}

/// Public projection returned after create/update. Never carries the hash.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserAuthenticated {
    pub id: i64,
    pub username: String,
    pub auth_token: String,
}

impl From<User> for UserAuthenticated {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            auth_token: u.auth_token,
        }
    }
}
