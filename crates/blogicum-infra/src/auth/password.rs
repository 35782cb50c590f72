//! Argon2id password hashes in PHC string format.

use std::sync::OnceLock;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng};
use argon2::{Algorithm, Argon2, Params, Version};

use blogicum_core::ports::{AuthError, PasswordService};

const DECOY_PASSWORD: &str = "blogicum-decoy-password";

pub struct Argon2PasswordService {
    argon2: Argon2<'static>,
    decoy_hash: OnceLock<Option<String>>,
}

impl Argon2PasswordService {
    pub fn new() -> Self {
        Self::with_params(Params::default())
    }

    /// Custom cost parameters. Hashes made with other parameters still verify,
    /// since the PHC string carries its own.
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            decoy_hash: OnceLock::new(),
        }
    }
}

impl Default for Argon2PasswordService {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordService for Argon2PasswordService {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|e| AuthError::UnusableHash(e.to_string()))?;
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::UnusableHash(e.to_string())),
        }
    }

    fn verify_decoy(&self, password: &str) {
        let decoy = self
            .decoy_hash
            .get_or_init(|| self.hash(DECOY_PASSWORD).ok());
        if let Some(hash) = decoy {
            let _ = self.verify(password, hash);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Argon2PasswordService {
        Argon2PasswordService::with_params(Params::new(1024, 1, 1, None).unwrap())
    }

    #[test]
    fn test_right_and_wrong_password() {
        let service = cheap();
        let hash = service.hash("wander-far-42").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(service.verify("wander-far-42", &hash).unwrap());
        assert!(!service.verify("wander-far-43", &hash).unwrap());
    }

    #[test]
    fn test_hash_from_other_params_still_verifies() {
        let hash = Argon2PasswordService::new().hash("wander-far-42").unwrap();
        assert!(cheap().verify("wander-far-42", &hash).unwrap());
    }

    #[test]
    fn test_unusable_hash_is_an_error() {
        assert!(matches!(
            cheap().verify("wander-far-42", "plaintext"),
            Err(AuthError::UnusableHash(_))
        ));
    }

    #[test]
    fn test_decoy_never_panics() {
        let service = cheap();
        service.verify_decoy("anything");
        service.verify_decoy("anything");
        assert!(service.decoy_hash.get().is_some());
    }
}
