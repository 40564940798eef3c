#![cfg(feature = "web")]
//! Bearer token issuing and verification
//!
//! Tokens are HS256 JWTs whose subject is the username. The server hands one
//! out on login and expects it back as `Authorization: Bearer <token>` on the
//! workout routes.

use crate::error::{Result, TrackerError};
use axum::http::{HeaderMap, header};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Username the token was issued to
    pub sub: String,
    /// Issued at, seconds since the epoch
    pub iat: i64,
    /// Expiration, seconds since the epoch
    pub exp: i64,
}

/// Signs and checks access tokens with a shared secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        TokenIssuer {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Issue a token for `username`, valid for the configured lifetime
    pub fn issue(&self, username: &str) -> Result<String> {
        let now = Utc::now();
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TrackerError::Internal("token lifetime out of range".to_string()))?;
        let claims = Claims {
            sub: username.to_string(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| TrackerError::Internal(format!("token encoding failed: {}", e)))
    }

    /// Verify signature and expiry, returning the claims
    ///
    /// # Errors
    /// * `TokenExpired` if `exp` is in the past
    /// * `InvalidToken` for any other decoding or signature failure
    pub fn verify(&self, token: &str) -> Result<Claims> {
        use jsonwebtoken::errors::ErrorKind;

        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TrackerError::TokenExpired,
                _ => TrackerError::InvalidToken(e.to_string()),
            })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(TrackerError::MissingToken)?
        .to_str()
        .map_err(|_| TrackerError::InvalidToken("header is not valid text".to_string()))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(TrackerError::InvalidToken(
            "expected 'Bearer <token>'".to_string(),
        )),
    }
}

/// Random secret for signing tokens, hex encoded
pub fn generate_secret() -> String {
    use rand::RngCore;

    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret", Duration::minutes(15))
    }

    #[test]
    fn issue_and_verify() {
        let issuer = issuer();
        let token = issuer.issue("alice").unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = issuer().issue("alice").unwrap();
        let other = TokenIssuer::new("another-secret", Duration::minutes(15));
        assert!(matches!(
            other.verify(&token),
            Err(TrackerError::InvalidToken(_))
        ));
    }

    #[test]
    fn expired_token_is_reported() {
        let issuer = issuer();
        let past = Utc::now() - Duration::hours(2);
        let token = issuer
            .sign(&Claims {
                sub: "alice".to_string(),
                iat: past.timestamp(),
                exp: (past + Duration::minutes(15)).timestamp(),
            })
            .unwrap();
        assert!(matches!(issuer.verify(&token), Err(TrackerError::TokenExpired)));
    }

    #[test]
    fn unrepresentable_lifetime_is_an_error() {
        let issuer = TokenIssuer::new("test-secret", Duration::MAX);
        assert!(matches!(issuer.issue("alice"), Err(TrackerError::Internal(_))));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(
            issuer().verify("not.a.jwt"),
            Err(TrackerError::InvalidToken(_))
        ));
    }

    #[test]
    fn bearer_header_parsing() {
        let mut headers = HeaderMap::new();
        assert!(matches!(bearer_token(&headers), Err(TrackerError::MissingToken)));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def");

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_err());
    }

    #[test]
    fn secrets_are_random_hex() {
        let a = generate_secret();
        let b = generate_secret();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
