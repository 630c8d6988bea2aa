//! HS256 JWT verification

use std::fmt::Debug;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Claims the gateway reads from a bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
}

impl Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Check signature and expiry, and the issuer when one is expected
    pub fn verify(&self, token: &str, issuer: Option<&str>) -> Result<JwtClaims, DomainError> {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }

        decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| DomainError::validation(format!("Invalid JWT: {}", e)))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    use super::JwtClaims;

    pub fn sign(secret: &str, sub: &str, iss: Option<&str>, ttl: Duration) -> String {
        let claims = JwtClaims {
            sub: Some(sub.to_string()),
            iss: iss.map(str::to_string),
            exp: (Utc::now() + ttl).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::test_support::sign;
    use super::*;

    #[test]
    fn test_verify_valid_token() {
        let verifier = JwtVerifier::new("secret");
        let token = sign("secret", "user-1", None, Duration::hours(1));

        let claims = verifier.verify(&token, None).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("user-1"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let verifier = JwtVerifier::new("secret");
        let token = sign("other", "user-1", None, Duration::hours(1));

        assert!(verifier.verify(&token, None).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = JwtVerifier::new("secret");
        let token = sign("secret", "user-1", None, Duration::hours(-2));

        assert!(verifier.verify(&token, None).is_err());
    }

    #[test]
    fn test_issuer_checked() {
        let verifier = JwtVerifier::new("secret");
        let token = sign("secret", "user-1", Some("auth.example"), Duration::hours(1));

        assert!(verifier.verify(&token, Some("auth.example")).is_ok());
        assert!(verifier.verify(&token, Some("other")).is_err());
    }
}
