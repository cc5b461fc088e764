//! Infrastructure layer for admin-auth
//!
//! Contains the credential store boundary and its implementations:
//! - [`PrincipalStore`] trait (external collaborator interface)
//! - In-memory store (development, tests)
//! - PostgreSQL store (production)

mod error;
mod memory;
pub mod postgres;
mod traits;

pub use error::*;
pub use memory::InMemoryPrincipalStore;
pub use postgres::PgPrincipalStore;
pub use traits::*;
