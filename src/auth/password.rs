use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, AssociatedData, ParamsBuilder, Version,
};
use rand::rngs::OsRng;
use tracing::error;

/// Argon2id hash with a random salt; `seq` is bound in as associated data and
/// travels inside the PHC string, so verification needs nothing else.
pub fn hash_password(seq: i64, plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let data = AssociatedData::new(&seq.to_be_bytes()).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let params = ParamsBuilder::new()
        .data(data)
        .build()
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
