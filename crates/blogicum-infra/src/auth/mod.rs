//! Session tokens and password hashing.

mod jwt;
mod password;

pub use jwt::{JwtConfig, JwtSessionTokens};
pub use password::Argon2PasswordService;
