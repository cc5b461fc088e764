//! REST API handlers organized by domain.

pub mod admin;
pub mod auth;
pub mod docs;
pub mod health;

pub use admin::*;
pub use auth::*;
pub use docs::*;
pub use health::*;
