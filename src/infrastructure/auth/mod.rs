//! Authentication infrastructure module
//!
//! This module provides JWT issuing and verification for customer credentials.

mod jwt;

pub use jwt::{token_expiry, JwtConfig, JwtService, TokenClaims, TokenIssuer};
