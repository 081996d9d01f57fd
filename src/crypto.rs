//! Password hashing.

use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Argon2, Params, Version};
use rand::rngs::OsRng;

use crate::config::Argon2 as ArgonConfig;

type Result<T> = std::result::Result<T, CryptoError>;

#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    #[error("argon2 error: {0}")]
    Argon2(String),
    #[error("stored hash is not a PHC string")]
    Phc,
}

/// Password manager that uses Argon2id and PHC string format for hashing and
/// verification.
#[derive(Debug, Clone)]
pub struct PasswordManager {
    params: Params,
}

impl PasswordManager {
    /// Create a new [`PasswordManager`].
    pub fn new(config: Option<ArgonConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();

        let params = Params::new(
            config.memory_cost,
            config.iterations,
            config.parallelism,
            Some(config.hash_length),
        )
        .map_err(|err| CryptoError::Argon2(err.to_string()))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(
            argon2::Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        )
    }

    /// Hash password using Argon2id.
    pub fn hash_password(&self, password: impl AsRef<[u8]>) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_ref(), &salt)
            .map_err(|e| CryptoError::Argon2(e.to_string()))?;

        Ok(hash.to_string())
    }

    /// Verify password against a PHC.
    ///
    /// The parameters encoded in `phc_hash` take precedence over ours.
    pub fn verify_password(
        &self,
        password: impl AsRef<[u8]>,
        phc_hash: &str,
    ) -> Result<()> {
        let parsed = PasswordHash::new(phc_hash).map_err(|_| CryptoError::Phc)?;

        self.argon2()
            .verify_password(password.as_ref(), &parsed)
            .map_err(|e| CryptoError::Argon2(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> PasswordManager {
        PasswordManager::new(Some(ArgonConfig {
            memory_cost: 1024,
            iterations: 1,
            parallelism: 1,
            hash_length: 32,
        }))
        .unwrap()
    }

    #[test]
    fn test_argon2() {
        let pwd = manager();
        let hash = pwd.hash_password("StRong_PaÂ§$W0rD").unwrap();

        assert!(hash.starts_with("$argon2id$v=19$"));
        assert!(pwd.verify_password("StRong_PaÂ§$W0rD", &hash).is_ok());
        assert!(pwd.verify_password("wrong", &hash).is_err());
    }

    #[test]
    fn test_salted() {
        let pwd = manager();
        assert_ne!(
            pwd.hash_password("same").unwrap(),
            pwd.hash_password("same").unwrap()
        );
    }

    #[test]
    fn test_invalid_phc() {
        assert!(matches!(
            manager().verify_password("password", "plain-text"),
            Err(CryptoError::Phc)
        ));
    }

    #[test]
    fn test_invalid_params() {
        let config = ArgonConfig {
            memory_cost: 1,
            ..Default::default()
        };
        assert!(PasswordManager::new(Some(config)).is_err());
    }
}
