//! Stateless session tokens (HS256 JWT).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 60 * 60;

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token secret must not be empty")]
    EmptySecret,
    #[error("token ttl must be positive")]
    InvalidTtl,
    /// Malformed, expired and badly signed tokens are not distinguished.
    #[error("invalid token")]
    InvalidToken,
    #[error("failed to sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("secret", &"***")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenIssuer {
    /// Build an issuer from the process-wide signing secret.
    ///
    /// # Errors
    /// Returns an error for an empty secret or a non-positive ttl.
    pub fn new(secret: &SecretString, ttl_seconds: i64) -> Result<Self, TokenError> {
        let secret = secret.expose_secret();
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        if ttl_seconds <= 0 {
            return Err(TokenError::InvalidTtl);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::seconds(ttl_seconds),
        })
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Sign a token for `user_id` / `username` expiring after the configured ttl.
    ///
    /// # Errors
    /// Only fails if the signer itself fails; well-formed claims always sign.
    pub fn issue(&self, user_id: Uuid, username: &str) -> Result<String, TokenError> {
        self.issue_at(user_id, username, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        user_id: Uuid,
        username: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = SessionClaims {
            user_id,
            username: username.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Signing)
    }

    /// Decode and check signature and expiry.
    ///
    /// # Errors
    /// Returns `TokenError::InvalidToken` for any rejected token.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| {
                debug!("Token rejected: {:?}", err.kind());
                TokenError::InvalidToken
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    fn issuer() -> Result<TokenIssuer, TokenError> {
        TokenIssuer::new(
            &SecretString::from(TEST_SECRET.to_string()),
            DEFAULT_TOKEN_TTL_SECONDS,
        )
    }

    #[test]
    fn issue_and_verify() -> Result<(), TokenError> {
        let issuer = issuer()?;
        let user_id = Uuid::new_v4();
        let token = issuer.issue(user_id, "alice_01")?;

        let claims = issuer.verify(&token)?;
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.username, "alice_01");
        assert_eq!(claims.exp - claims.iat, DEFAULT_TOKEN_TTL_SECONDS);
        Ok(())
    }

    #[test]
    fn claims_use_user_id_key() -> Result<(), TokenError> {
        let claims = SessionClaims {
            user_id: Uuid::nil(),
            username: "alice_01".to_string(),
            iat: 0,
            exp: 1,
        };
        let json = serde_json::to_value(&claims).map_err(|_| TokenError::InvalidToken)?;
        assert!(json.get("userId").is_some());
        assert!(json.get("user_id").is_none());
        Ok(())
    }

    #[test]
    fn expired_token_is_invalid() -> Result<(), TokenError> {
        let issuer = issuer()?;
        let token = issuer.issue_at(
            Uuid::new_v4(),
            "alice_01",
            Utc::now() - Duration::hours(2),
        )?;
        assert!(matches!(
            issuer.verify(&token),
            Err(TokenError::InvalidToken)
        ));
        Ok(())
    }

    #[test]
    fn wrong_secret_is_invalid() -> Result<(), TokenError> {
        let token = issuer()?.issue(Uuid::new_v4(), "alice_01")?;
        let other = TokenIssuer::new(
            &SecretString::from("another-secret-key-for-testing-32-chars".to_string()),
            DEFAULT_TOKEN_TTL_SECONDS,
        )?;
        assert!(matches!(other.verify(&token), Err(TokenError::InvalidToken)));
        Ok(())
    }

    #[test]
    fn malformed_token_is_invalid() -> Result<(), TokenError> {
        let issuer = issuer()?;
        assert!(matches!(
            issuer.verify("invalid.token.here"),
            Err(TokenError::InvalidToken)
        ));
        assert!(matches!(issuer.verify(""), Err(TokenError::InvalidToken)));
        Ok(())
    }

    #[test]
    fn rejects_empty_secret_and_bad_ttl() {
        assert!(matches!(
            TokenIssuer::new(&SecretString::from(String::new()), 60),
            Err(TokenError::EmptySecret)
        ));
        assert!(matches!(
            TokenIssuer::new(&SecretString::from(TEST_SECRET.to_string()), 0),
            Err(TokenError::InvalidTtl)
        ));
    }

    #[test]
    fn debug_redacts_secret() -> Result<(), TokenError> {
        let rendered = format!("{:?}", issuer()?);
        assert!(!rendered.contains(TEST_SECRET));
        Ok(())
    }
}
