//! Middleware modules.

pub mod auth;
pub mod error;
pub mod origin;
pub mod rate_limit;
