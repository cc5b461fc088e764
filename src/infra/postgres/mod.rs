//! PostgreSQL implementations of the credential store

mod principals;

pub use principals::*;
