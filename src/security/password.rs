//! Password hashing and verification utilities.
//!
//! Credentials are stored as Argon2 PHC strings; the connection supervisor
//! compares the handshake password against them.

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

/// Hash a password using default Argon2 settings.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    Ok(argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Check `password` against a stored PHC hash string.
///
/// An unparseable stored hash never matches.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is not a valid PHC string");
            false
        }
    }
}

/// Burn roughly one verification's worth of CPU for an unknown user, so
/// response time does not reveal whether a username exists.
pub fn dummy_verify(password: &str) {
    // Argon2id hash of a random throwaway value.
    const DUMMY_HASH: &str =
        "$argon2id$v=19$m=19456,t=2,p=1$cmVsYXlkLWR1bW15LXNhbHQ$xxp84dBEIqiTk/nzR/nIa9YfZzrP8Up1RVT/MLn/L90";

    if let Ok(parsed) = PasswordHash::new(DUMMY_HASH) {
        let _ = Argon2::default().verify_password(password.as_bytes(), &parsed);
    }
}
