//! Credential services: session tokens and password digests.

mod jwt;
mod password;

pub use jwt::{JwtConfig, JwtTokenService};
pub use password::{Argon2PasswordService, PasswordCost};
