pub mod models;
pub mod votes;

pub use models::*;
pub use votes::*;
