use serde::{Deserialize, Serialize};

/// JWT payload of an account auth token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // account id
    pub seq: i64,     // account sequence number at issue time
    pub name: String, // username at issue time
    pub iat: usize,   // issued at (unix timestamp)
    pub jti: String,  // random nonce, distinguishes rotated tokens
    pub iss: String,  // issuer
    pub aud: String,  // audience
}
