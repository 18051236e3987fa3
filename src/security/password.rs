use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Argon2Config {
    pub memory_cost_kib: u32,
    pub time_cost: u32,
    pub parallelism: u32,
    pub output_length: usize,
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            memory_cost_kib: 19456,
            time_cost: 2,
            parallelism: 1,
            output_length: 32,
        }
    }
}

impl Argon2Config {
    pub fn low_memory() -> Self {
        Self {
            memory_cost_kib: 8192,
            time_cost: 1,
            parallelism: 1,
            output_length: 32,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PasswordHasher {
    config: Argon2Config,
}

impl PasswordHasher {
    pub fn new(config: Argon2Config) -> Result<Self> {
        let hasher = Self { config };
        hasher.argon2()?;
        Ok(hasher)
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(Argon2Config::default())
    }

    fn argon2(&self) -> Result<Argon2<'static>> {
        let params = Params::new(
            self.config.memory_cost_kib,
            self.config.time_cost,
            self.config.parallelism,
            Some(self.config.output_length),
        )
        .map_err(|e| anyhow!("Invalid Argon2 parameters: {e}"))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Rejects passwords outside the accepted length window.
    pub fn check_policy(&self, password: &str) -> Result<(), String> {
        let len = password.chars().count();
        if len < MIN_PASSWORD_LENGTH {
            return Err(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            ));
        }
        if len > MAX_PASSWORD_LENGTH {
            return Err(format!(
                "Password must be at most {MAX_PASSWORD_LENGTH} characters"
            ));
        }
        Ok(())
    }

    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("Failed to hash password: {e}"))?;
        Ok(hash.to_string())
    }

    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| anyhow!("Invalid password hash: {e}"))?;
        match self.argon2()?.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => {
                debug!("Password verification failed");
                Ok(false)
            }
            Err(e) => Err(anyhow!("Password verification error: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(Argon2Config::low_memory()).expect("Failed to create hasher")
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = hasher();
        let hash = hasher.hash("wrench-and-gauge").expect("Failed to hash");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("wrench-and-gauge", &hash).expect("Verify failed"));
        assert!(!hasher.verify("WrongPassword", &hash).expect("Verify failed"));
    }

    #[test]
    fn test_same_password_different_salts() {
        let hasher = hasher();
        let a = hasher.hash("wrench-and-gauge").expect("Failed to hash");
        let b = hasher.hash("wrench-and-gauge").expect("Failed to hash");
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(hasher().verify("anything", "plaintext").is_err());
    }

    #[test]
    fn test_policy() {
        let hasher = hasher();
        assert!(hasher.check_policy("short").is_err());
        assert!(hasher.check_policy("long-enough").is_ok());
        assert!(hasher.check_policy(&"x".repeat(200)).is_err());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let config = Argon2Config {
            memory_cost_kib: 1,
            ..Argon2Config::low_memory()
        };
        assert!(PasswordHasher::new(config).is_err());
    }
}
