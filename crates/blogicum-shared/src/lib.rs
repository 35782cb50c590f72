//! # Blogicum Shared
//!
//! Wire-level types of the web app: query strings, and the descriptor
//! rendered by error pages.

pub mod dto;
pub mod response;

pub use response::{ErrorKind, ErrorPage};
