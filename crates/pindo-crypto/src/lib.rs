/// Pindogram credential library.
///
/// Passwords are stored as HMAC-SHA512 digests keyed with a fresh
/// 128-byte random salt per credential. Verification recomputes the digest
/// with the stored salt and compares it in constant time.

pub mod credentials;

pub use credentials::{
    Credential, CredentialError, HASH_LEN, SALT_LEN, hash_password, verify_password,
};
