pub mod access_jwt;
pub mod factory;

pub use access_jwt::{TokenVerifier, VerifiedClaims};
pub use factory::build_token_verifier;
