/// Password hashing for the in-process identity store
///
/// The hosted identity service hashes passwords itself; this module only backs
/// [`super::memory::MemoryIdentity`], which keeps accounts in memory when the
/// server runs offline. Hashes are Argon2id PHC strings (19 MiB, 2 passes,
/// 1 lane).
///
/// ```
/// use taskboard_shared::auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("hunter22").unwrap();
/// assert!(verify_password("hunter22", &hash).unwrap());
/// assert!(!verify_password("hunter23", &hash).unwrap());
/// ```

use argon2::{
    password_hash::{self, rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

const MEMORY_KIB: u32 = 19 * 1024;
const PASSES: u32 = 2;
const LANES: u32 = 1;

/// Hashing or verification failure
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Argon2 rejected the parameters or the input
    #[error("Password hashing failed: {0}")]
    Hash(password_hash::Error),

    /// Stored value is not a PHC string
    #[error("Stored password hash is malformed: {0}")]
    Malformed(password_hash::Error),
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(MEMORY_KIB, PASSES, LANES, None)
        .map_err(|e| PasswordError::Hash(e.into()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password with a fresh salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(PasswordError::Hash)
}

/// Checks a password against a stored hash
///
/// `Ok(false)` means the password is wrong; `Err` means the hash is unusable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let stored = PasswordHash::new(hash).map_err(PasswordError::Malformed)?;

    match hasher()?.verify_password(password.as_bytes(), &stored) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Hash(e)),
    }
}
