//! Authentication, voting and moderation rules for Pindogram.
//!
//! Every operation takes the persistence collaborator explicitly as its
//! first argument; nothing here holds process-wide state.

pub mod accounts;
pub mod error;
pub mod moderation;
pub mod store;
pub mod votes;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
pub use store::{Records, Store};
