use pindo_crypto::CredentialError;
use pindo_types::ParseDirectionError;
use thiserror::Error;

/// Failures surfaced to callers of the core.
///
/// A failed login is not an error; `accounts::authenticate` returns `None`
/// for both unknown users and wrong passwords.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing argument, bad vote direction, corrupt credential.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Duplicate username or an otherwise rejected registration.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Referenced user, group or meme does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Raised by the persistence collaborator and passed through untouched.
    #[error("storage error: {0}")]
    Store(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<CredentialError> for Error {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::InvalidInput(msg) => Error::InvalidInput(msg.to_string()),
            other => Error::InvalidInput(other.to_string()),
        }
    }
}

impl From<ParseDirectionError> for Error {
    fn from(err: ParseDirectionError) -> Self {
        Error::InvalidInput(err.to_string())
    }
}

impl Error {
    pub(crate) fn user_not_found(id: i64) -> Self {
        Error::NotFound(format!("user {}", id))
    }

    pub(crate) fn meme_not_found(id: i64) -> Self {
        Error::NotFound(format!("meme {}", id))
    }
}
