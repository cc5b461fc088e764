//! Domain models for admin-auth
//!
//! The only persistent record owned by the auth core is the administrator
//! [`Principal`].

mod principal;

pub use principal::*;
