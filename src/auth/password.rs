use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

/// Capability interface for password hashing so tests can swap in a cheap
/// scheme. `verify` returns `Ok(false)` on mismatch; `Err` means the stored
/// hash itself could not be parsed.
pub trait PasswordScheme: Send + Sync {
    fn hash(&self, plain: &str) -> anyhow::Result<String>;
    fn verify(&self, plain: &str, hash: &str) -> anyhow::Result<bool>;
}

/// Production scheme: Argon2 with a fresh random salt per hash.
pub struct Argon2Scheme;

impl PasswordScheme for Argon2Scheme {
    fn hash(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    fn verify(&self, plain: &str, hash: &str) -> anyhow::Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            anyhow::anyhow!(e.to_string())
        })?;
        Ok(Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = Argon2Scheme.hash(password).expect("hashing should succeed");
        assert!(Argon2Scheme
            .verify(password, &hash)
            .expect("verify should succeed"));
    }

    #[test]
    fn hash_is_salted_and_never_the_plaintext() {
        let password = "correct-horse-battery-staple";
        let first = Argon2Scheme.hash(password).expect("hashing should succeed");
        let second = Argon2Scheme.hash(password).expect("hashing should succeed");
        assert_ne!(first, password);
        assert!(first.starts_with("$argon2"));
        // fresh salt per hash
        assert_ne!(first, second);
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = Argon2Scheme.hash(password).expect("hashing should succeed");
        assert!(!Argon2Scheme
            .verify("wrong-password", &hash)
            .expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = Argon2Scheme.verify("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}
