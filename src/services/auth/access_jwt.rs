use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::{error::Error as StdError, fmt};

use crate::authz::{AuthError, Principal, Role, UserId};

// Errors returned by access-token verification. Only ever logged: callers see `AuthError::InvalidToken`.
#[derive(Debug)]
pub enum VerifyError {
    Expired,
    BadSignature,
    Malformed(jsonwebtoken::errors::Error),
    EmptyClaim(&'static str),
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expired => write!(f, "token expired"),
            Self::BadSignature => write!(f, "token signature mismatch"),
            Self::Malformed(e) => write!(f, "token malformed: {}", e),
            Self::EmptyClaim(name) => write!(f, "empty '{}' claim", name),
        }
    }
}

impl StdError for VerifyError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Malformed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for VerifyError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::BadSignature,
            _ => Self::Malformed(e),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VerifierConfigError {
    #[error("token signing secret must not be empty")]
    EmptySecret,
}

/// Access token claims as issued at login.
///
/// `role` is a closed enum: a token carrying any other role string fails to decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub exp: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Claims that passed signature, expiry and issuer checks.
///
/// The field is private to this module, so a value of this type can only come out of
/// `TokenVerifier::verify`. `Principal` is built from it and nothing else.
#[derive(Debug, Clone)]
pub struct VerifiedClaims {
    claims: AccessClaims,
}

impl VerifiedClaims {
    pub fn into_claims(self) -> AccessClaims {
        self.claims
    }
}

/// HS256 access-token verifier.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(
        secret: &str,
        issuer: Option<&str>,
        leeway_seconds: u64,
    ) -> Result<Self, VerifierConfigError> {
        if secret.is_empty() {
            return Err(VerifierConfigError::EmptySecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_seconds;
        validation.validate_aud = false;
        if let Some(iss) = issuer {
            // set_issuer alone lets a token without `iss` through
            validation.set_issuer(&[iss]);
            validation.set_required_spec_claims(&["exp", "iss"]);
        }

        Ok(Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Verify signature + `exp` (+ `iss` when configured) and decode the claims.
    ///
    /// Pure CPU work, no I/O.
    pub fn verify(&self, token: &str) -> Result<VerifiedClaims, VerifyError> {
        let data =
            jsonwebtoken::decode::<AccessClaims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        if claims.email.trim().is_empty() {
            return Err(VerifyError::EmptyClaim("email"));
        }

        Ok(VerifiedClaims { claims })
    }

    /// Entry-point for the request pipeline: turns the (possibly absent) credential into a
    /// principal.
    ///
    /// Absence is `MissingToken`. Every verification failure collapses into `InvalidToken`
    /// so callers cannot tell expired from forged.
    pub fn authenticate(&self, token: Option<&str>) -> Result<Principal, AuthError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        match self.verify(token) {
            Ok(verified) => Ok(Principal::from(verified)),
            Err(err) => {
                tracing::warn!(error = %err, "access token verification failed");
                Err(AuthError::InvalidToken)
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(SECRET, None, 0).unwrap()
    }

    #[test]
    fn valid_token_yields_principal() {
        let p = verifier()
            .authenticate(Some(&token(5, Role::User)))
            .unwrap();
        assert_eq!(p.id(), 5);
        assert_eq!(p.role(), Role::User);
        assert_eq!(p.email(), "user5@example.com");
    }

    #[test]
    fn expired_and_forged_tokens_are_indistinguishable() {
        let v = verifier();
        let expired = sign_with(SECRET, &claims(5, Role::User, now() - 3600));
        let forged = sign_with("some-other-secret", &claims(5, Role::Admin, now() + 3600));

        assert!(matches!(v.verify(&expired), Err(VerifyError::Expired)));
        assert!(matches!(v.verify(&forged), Err(VerifyError::BadSignature)));

        assert_eq!(v.authenticate(Some(&expired)), Err(AuthError::InvalidToken));
        assert_eq!(v.authenticate(Some(&forged)), Err(AuthError::InvalidToken));
        assert_eq!(
            v.authenticate(Some("invalid.token.here")),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn missing_token_is_distinct_precondition() {
        let v = verifier();
        assert_eq!(v.authenticate(None), Err(AuthError::MissingToken));
        assert_eq!(v.authenticate(Some("")), Err(AuthError::MissingToken));
    }

    #[test]
    fn unknown_role_claim_is_rejected() {
        let header = jsonwebtoken::Header::default();
        let body = serde_json::json!({
            "id": 5,
            "email": "a@example.com",
            "role": "superuser",
            "exp": now() + 3600,
        });
        let t = jsonwebtoken::encode(
            &header,
            &body,
            &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(verifier().authenticate(Some(&t)), Err(AuthError::InvalidToken));
    }

    #[test]
    fn issuer_is_checked_when_configured() {
        let v = TokenVerifier::new(SECRET, Some("users-api"), 0).unwrap();
        let mut c = claims(1, Role::Admin, now() + 3600);
        assert!(v.verify(&sign_with(SECRET, &c)).is_err());

        c.iss = Some("users-api".to_string());
        assert!(v.verify(&sign_with(SECRET, &c)).is_ok());
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(
            TokenVerifier::new("", None, 0),
            Err(VerifierConfigError::EmptySecret)
        ));
    }
}
