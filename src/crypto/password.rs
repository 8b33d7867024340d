use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;

use crate::error::AppError;

const DUMMY_PASSWORD: &str = "messagely-dummy-password";

/// Argon2id password hashing with a configurable work factor.
///
/// Digests are PHC strings (`$argon2id$v=19$...`) carrying their own salt
/// and parameters, so digests produced under an older work factor still
/// verify after the factor is raised.
#[derive(Clone)]
pub struct CredentialStore {
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl CredentialStore {
    /// `work_factor` is the argon2 time cost (iterations over memory).
    pub fn new(work_factor: u32) -> Result<Self, AppError> {
        let params = Params::new(
            Params::DEFAULT_M_COST,
            work_factor,
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| AppError::Config(format!("Invalid hash work factor {}: {}", work_factor, e)))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let mut store = Self {
            argon2,
            dummy_hash: String::new(),
        };
        store.dummy_hash = store.hash(DUMMY_PASSWORD)?;

        Ok(store)
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| AppError::Crypto(format!("Password hashing failed: {}", e)))?;

        Ok(hash.to_string())
    }

    /// Verify a password against a stored digest. Malformed digests never match.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        let parsed = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Stored password digest is malformed: {}", e);
                return false;
            }
        };

        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    /// Burn one verification's worth of work when there is no digest to check.
    pub fn verify_dummy(&self, plaintext: &str) -> bool {
        self.verify(plaintext, &self.dummy_hash);
        false
    }
}
