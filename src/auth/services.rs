use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use crate::auth::{jwt::JwtKeys, password};
use crate::state::AppState;

const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 32;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.\-]*$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub fn is_valid_username(username: &str) -> bool {
    (MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&username.len())
        && USERNAME_RE.is_match(username)
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LENGTH && EMAIL_RE.is_match(email)
}

/// Length bounds, at least one letter and one digit, no whitespace or control characters.
pub fn is_valid_password(password: &str) -> bool {
    let len = password.chars().count();
    (MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&len)
        && !password.chars().any(|c| c.is_whitespace() || c.is_control())
        && password.chars().any(char::is_alphabetic)
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Stateless credential helper: hashing, token issue and verification.
#[derive(Clone)]
pub struct AuthService {
    keys: JwtKeys,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(JwtKeys::from_ref(state))
    }
}

impl AuthService {
    pub fn new(keys: JwtKeys) -> Self {
        Self { keys }
    }

    pub fn validate_username(&self, username: &str) -> bool {
        is_valid_username(username)
    }

    pub fn validate_email(&self, email: &str) -> bool {
        is_valid_email(email)
    }

    pub fn validate_password(&self, password: &str) -> bool {
        is_valid_password(password)
    }

    pub fn hash_password(&self, seq: i64, plain: &str) -> anyhow::Result<String> {
        password::hash_password(seq, plain)
    }

    pub fn verify_password(&self, plain: &str, stored_hash: &str) -> bool {
        match password::verify_password(plain, stored_hash) {
            Ok(ok) => ok,
            Err(e) => {
                warn!(error = %e, "stored password hash is unreadable");
                false
            }
        }
    }

    pub fn generate_auth_token(&self, id: i64, seq: i64, username: &str) -> anyhow::Result<String> {
        self.keys.sign(id, seq, username)
    }

    /// True when `token` is a genuine token issued for account `id`.
    pub fn verify_auth_token_and_id(&self, id: i64, token: &str) -> bool {
        match self.keys.verify(token) {
            Ok(claims) => claims.sub == id.to_string(),
            Err(e) => {
                warn!(error = %e, account_id = id, "auth token rejected");
                false
            }
        }
    }
}
