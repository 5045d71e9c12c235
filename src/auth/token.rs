//! Signed bearer tokens (HS256 JWT).

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::AlertDeskError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: i64,
    pub exp: i64, // Expiration time
    pub iat: i64, // Issued at
}

impl TokenClaims {
    pub fn new(user_id: i64, auth: &AuthConfig) -> Self {
        let now = Utc::now();
        let exp = now + auth.token_ttl();

        Self {
            user_id,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }
}

pub fn issue_token(user_id: i64, auth: &AuthConfig) -> Result<String, AlertDeskError> {
    encode_claims(&TokenClaims::new(user_id, auth), auth)
}

pub(crate) fn encode_claims(claims: &TokenClaims, auth: &AuthConfig) -> Result<String, AlertDeskError> {
    let key = EncodingKey::from_secret(auth.secret_key.as_bytes());
    Ok(encode(&Header::default(), claims, &key)?)
}

/// Checks signature and expiry. Every failure here is the client's problem,
/// so it comes back as a 401 rather than a server error.
pub fn verify_token(token: &str, auth: &AuthConfig) -> Result<TokenClaims, AlertDeskError> {
    let key = DecodingKey::from_secret(auth.secret_key.as_bytes());

    decode::<TokenClaims>(token, &key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| {
            log::debug!("Token rejected: {}", e);
            AlertDeskError::Unauthenticated("Invalid token")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_auth() -> AuthConfig {
        AuthConfig {
            secret_key: "test-secret-key-for-jwt".to_string(),
            token_ttl_hours: 24,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let auth = test_auth();
        let token = issue_token(42, &auth).unwrap();

        let claims = verify_token(&token, &auth).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_wrong_secret() {
        let auth = test_auth();
        let token = issue_token(42, &auth).unwrap();

        let other = AuthConfig {
            secret_key: "different-secret".to_string(),
            ..test_auth()
        };
        assert!(matches!(
            verify_token(&token, &other),
            Err(AlertDeskError::Unauthenticated("Invalid token"))
        ));
    }

    #[test]
    fn test_expired_token() {
        let auth = test_auth();
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            user_id: 42,
            exp: now - 3600,
            iat: now - 3600 * 25,
        };
        let token = encode_claims(&claims, &auth).unwrap();

        assert!(matches!(
            verify_token(&token, &auth),
            Err(AlertDeskError::Unauthenticated(_))
        ));
    }

    #[test]
    fn test_malformed_tokens() {
        let auth = test_auth();
        for token in ["not.a.token", "invalid", "", "too.many.parts.in.this.token"] {
            assert!(
                matches!(verify_token(token, &auth), Err(AlertDeskError::Unauthenticated(_))),
                "Expected Unauthenticated for token: {}",
                token
            );
        }
    }
}
