use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use thiserror::Error;

/// Default Argon2 time cost. Combined with the crate's default memory cost this keeps
/// a single verify well under 200ms on commodity hardware.
pub const DEFAULT_COST: u32 = 2;

/// HashError
///
/// Infrastructure-level failures of the hashing layer. A wrong password is NOT an
/// error; `CredentialHasher::verify` reports it as `Ok(false)`.
#[derive(Debug, Error)]
pub enum HashError {
    /// The stored hash does not parse as a PHC-encoded string. This indicates data
    /// corruption or a migration problem, never a caller mistake.
    #[error("stored hash is not a valid PHC string")]
    MalformedHash,
    /// The underlying hash computation failed (salt encoding, parameter rejection).
    #[error("password hashing failed: {0}")]
    Hashing(argon2::password_hash::Error),
}

/// CredentialHasher
///
/// One-way salted password hashing (Argon2id). The time cost is injected from
/// configuration at construction; memory and parallelism stay at the crate defaults.
/// Each `hash` call draws a fresh random salt, so hashing the same plaintext twice
/// yields different encoded strings that both verify.
#[derive(Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    pub fn new(cost: u32) -> Self {
        // Out-of-range costs fall back to the crate defaults rather than failing startup.
        let params = Params::new(Params::DEFAULT_M_COST, cost, Params::DEFAULT_P_COST, None)
            .unwrap_or_default();
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Produces a PHC-encoded Argon2id hash of `plaintext` under a fresh random salt.
    /// The salt and cost parameters are embedded in the output, so `verify` needs no
    /// out-of-band state.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let salt = salt()?;
        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(HashError::Hashing)
    }

    /// Recomputes the hash under the stored value's own parameters and compares.
    /// Mismatch is the normal `Ok(false)` outcome; only a malformed stored value or an
    /// infrastructure failure is an `Err`. The comparison itself is delegated to the
    /// argon2 crate's constant-time verify.
    pub fn verify(&self, stored: &str, plaintext: &str) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(stored).map_err(|_| HashError::MalformedHash)?;
        match self.argon2().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashError::Hashing(e)),
        }
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

fn salt() -> Result<SaltString, HashError> {
    use rand::Rng;
    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    SaltString::encode_b64(&bytes).map_err(HashError::Hashing)
}
