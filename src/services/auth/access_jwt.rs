use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Errors returned by access-token verification + strict claim validation.
#[derive(Debug, Error)]
pub enum AccessJwtError {
    #[error("jwt verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("empty '{0}' claim")]
    EmptyClaim(&'static str),
}

impl AccessJwtError {
    /// Short reason suitable for a client-facing error body.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Jwt(e) => match e.kind() {
                ErrorKind::ExpiredSignature => "token expired",
                ErrorKind::InvalidSignature => "invalid token signature",
                ErrorKind::InvalidIssuer => "invalid token issuer",
                ErrorKind::MissingRequiredClaim(_) => "token is missing a required claim",
                _ => "malformed token",
            },
            Self::EmptyClaim(_) => "token is missing a required claim",
        }
    }
}

/// Access token (JWT) claims.
///
/// Issued by `JwtIssuer` and read back by `AccessTokenVerifier`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    pub exp: u64,
    #[serde(default)]
    pub iat: Option<u64>,
    #[serde(default)]
    pub jti: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Verified token converted into what the rest of the app uses.
#[derive(Debug, Clone)]
pub struct VerifiedAccessToken {
    pub subject: String,
    pub token_id: Option<String>,
    pub authorities: Vec<String>,
}

/// HS512 access-token verifier.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct AccessTokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for AccessTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("AccessTokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl AccessTokenVerifier {
    pub fn new(secret: &[u8], issuer: Option<&str>, leeway_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS512);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.validate_aud = false;
        validation.leeway = leeway_seconds;
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    // Verify and decode a JWT access token.
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, jsonwebtoken::errors::Error> {
        let data =
            jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)?;

        Ok(data.claims)
    }

    /// Verify + strict claim validation.
    ///
    /// `jsonwebtoken::Validation` already checks signature, `exp` and `iss` (when configured).
    /// This additionally rejects an empty `sub` and a zero `exp`.
    pub fn verify_strict(&self, token: &str) -> Result<AccessTokenClaims, AccessJwtError> {
        let claims = self.verify(token)?;

        if claims.sub.trim().is_empty() {
            return Err(AccessJwtError::EmptyClaim("sub"));
        }
        if claims.exp == 0 {
            return Err(AccessJwtError::EmptyClaim("exp"));
        }

        Ok(claims)
    }

    /// Entry point for the authentication middleware.
    pub fn verify_verified(&self, token: &str) -> Result<VerifiedAccessToken, AccessJwtError> {
        let claims = self.verify_strict(token)?;

        Ok(VerifiedAccessToken {
            subject: claims.sub,
            token_id: claims.jti,
            authorities: claims.roles,
        })
    }
}
