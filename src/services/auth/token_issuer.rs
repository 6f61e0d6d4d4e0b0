use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use tracing::error;
use uuid::Uuid;

use crate::services::auth::access_jwt::{AccessJwtError, AccessTokenClaims};

/// Access token handed back to a client after sign-in.
#[derive(Clone, Debug)]
pub struct IssuedAccessToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

#[derive(Clone)]
pub struct JwtIssuer {
    issuer: Option<String>,
    ttl_seconds: u64,
    encoding_key: EncodingKey,
}

impl std::fmt::Debug for JwtIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIssuer")
            .field("issuer", &self.issuer)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl JwtIssuer {
    pub fn new(secret: &[u8], issuer: Option<String>, ttl_seconds: u64) -> Self {
        Self {
            issuer,
            ttl_seconds,
            encoding_key: EncodingKey::from_secret(secret),
        }
    }

    pub fn issue_access_token(
        &self,
        subject: &str,
        roles: &[String],
    ) -> Result<IssuedAccessToken, AccessJwtError> {
        self.issue_access_token_at(subject, roles, Utc::now())
    }

    /// Issue a token as if signed at `issued_at`.
    pub fn issue_access_token_at(
        &self,
        subject: &str,
        roles: &[String],
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedAccessToken, AccessJwtError> {
        let iat = u64::try_from(issued_at.timestamp()).unwrap_or(0);

        let claims = AccessTokenClaims {
            sub: subject.to_string(),
            exp: iat.saturating_add(self.ttl_seconds),
            iat: Some(iat),
            jti: Some(Uuid::new_v4().to_string()),
            iss: self.issuer.clone(),
            roles: roles.to_vec(),
        };

        let mut header = Header::new(Algorithm::HS512);
        header.typ = Some("JWT".to_string());
        let access_token =
            jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| {
                error!(error = %e, "failed to sign JWT");
                AccessJwtError::Jwt(e)
            })?;

        Ok(IssuedAccessToken {
            access_token,
            token_type: "Bearer",
            expires_in: self.ttl_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::access_jwt::AccessTokenVerifier;

    const SECRET: &[u8] = b"issuer-test-secret-that-is-long-enough-for-hs512";

    #[test]
    fn test_issued_token_verifies() {
        let issuer = JwtIssuer::new(SECRET, Some("contacts".to_string()), 600);
        let verifier = AccessTokenVerifier::new(SECRET, Some("contacts"), 0);

        let issued = issuer
            .issue_access_token("alice", &["ROLE_ADMIN".to_string()])
            .expect("issue");
        assert_eq!(issued.token_type, "Bearer");
        assert_eq!(issued.expires_in, 600);

        let verified = verifier
            .verify_verified(&issued.access_token)
            .expect("verify");
        assert_eq!(verified.subject, "alice");
        assert_eq!(verified.authorities, vec!["ROLE_ADMIN".to_string()]);
        assert!(verified.token_id.is_some());
    }

    #[test]
    fn test_token_issued_in_the_past_is_expired() {
        let issuer = JwtIssuer::new(SECRET, None, 60);
        let verifier = AccessTokenVerifier::new(SECRET, None, 0);

        let issued = issuer
            .issue_access_token_at("alice", &[], Utc::now() - chrono::Duration::hours(1))
            .expect("issue");

        let err = verifier
            .verify_verified(&issued.access_token)
            .expect_err("expired");
        assert_eq!(err.reason(), "token expired");
    }

    #[test]
    fn test_each_token_has_unique_id() {
        let issuer = JwtIssuer::new(SECRET, None, 60);
        let verifier = AccessTokenVerifier::new(SECRET, None, 0);

        let first = issuer.issue_access_token("alice", &[]).expect("first");
        let second = issuer.issue_access_token("alice", &[]).expect("second");

        let first = verifier.verify_verified(&first.access_token).expect("first");
        let second = verifier
            .verify_verified(&second.access_token)
            .expect("second");
        assert_ne!(first.token_id, second.token_id);
    }
}
