use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

fn failure(op: &'static str, e: password_hash::Error) -> anyhow::Error {
    error!(op, error = %e, "argon2 failure");
    anyhow::anyhow!("password {op} failed: {e}")
}

/// Salted one-way hash in PHC string form.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| failure("hash", e))
}

/// Checks `plain` against a stored PHC hash. A mismatch is `Ok(false)`; a
/// hash that cannot be parsed or checked is an error.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| failure("parse", e))?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(failure("verify", e)),
    }
}
