//! API layer for admin-auth
//!
//! REST endpoints for registration, login and authenticated admin routes.

pub mod error;
pub mod handlers;
mod rest;
pub mod types;

pub use error::{ApiError, ErrorCode, ERROR_CODE_HEADER};
pub use rest::*;
