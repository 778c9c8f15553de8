//! Factory: build `TokenVerifier` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::TokenVerifier;
use crate::services::auth::access_jwt::VerifierConfigError;

pub fn build_token_verifier(config: &Config) -> Result<Arc<TokenVerifier>, VerifierConfigError> {
    let verifier = TokenVerifier::new(
        &config.jwt_secret,
        config.auth_issuer.as_deref(),
        config.access_token_leeway_seconds,
    )?;

    Ok(Arc::new(verifier))
}
