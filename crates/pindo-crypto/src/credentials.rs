use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha512;
use thiserror::Error;

type HmacSha512 = Hmac<Sha512>;

/// Digest length of HMAC-SHA512.
pub const HASH_LEN: usize = 64;
/// Salt length, equal to the SHA-512 block size so the key is used unpadded.
pub const SALT_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("MAC key rejected")]
    Key,
}

/// Stored form of a password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub hash: Vec<u8>,
    pub salt: Vec<u8>,
}

/// Derive a credential for `password` with a newly generated salt.
pub fn hash_password(password: &str) -> Result<Credential, CredentialError> {
    check_password(password)?;

    let mut salt = vec![0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);

    let hash = keyed_digest(&salt, password)?
        .finalize()
        .into_bytes()
        .to_vec();

    Ok(Credential { hash, salt })
}

/// Check `password` against a stored hash/salt pair.
///
/// Malformed records (wrong hash or salt length) are reported as errors
/// rather than as a mismatch. The comparison always covers all 64 bytes.
pub fn verify_password(
    password: &str,
    stored_hash: &[u8],
    stored_salt: &[u8],
) -> Result<bool, CredentialError> {
    check_password(password)?;
    if stored_hash.len() != HASH_LEN {
        return Err(CredentialError::InvalidInput("stored hash must be 64 bytes"));
    }
    if stored_salt.len() != SALT_LEN {
        return Err(CredentialError::InvalidInput("stored salt must be 128 bytes"));
    }

    Ok(keyed_digest(stored_salt, password)?
        .verify_slice(stored_hash)
        .is_ok())
}

fn check_password(password: &str) -> Result<(), CredentialError> {
    if password.trim().is_empty() {
        return Err(CredentialError::InvalidInput("password must not be empty"));
    }
    Ok(())
}

fn keyed_digest(key: &[u8], password: &str) -> Result<HmacSha512, CredentialError> {
    let mut mac = HmacSha512::new_from_slice(key).map_err(|_| CredentialError::Key)?;
    mac.update(password.as_bytes());
    Ok(mac)
}
