//! Token issuance and verification.
//!
//! Tokens are HS256 JWTs. The wire claims keep a `refresh` boolean; inside the
//! crate that flag is decoded once into [`TokenKind`] and never re-read.

pub mod password;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::database::DatabaseError;

/// The two token kinds. Fixed at issuance, checked on every guarded request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }

    fn from_refresh_flag(refresh: bool) -> Self {
        if refresh {
            TokenKind::Refresh
        } else {
            TokenKind::Access
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire format of the JWT payload.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    #[serde(default)]
    admin: bool,
    #[serde(default)]
    refresh: bool,
    jti: Uuid,
    iat: i64,
    exp: i64,
}

/// A token whose signature and expiry have been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub user_id: Uuid,
    pub admin: bool,
    pub kind: TokenKind,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No valid token provided")]
    MissingToken,

    #[error("Malformed authorization header: {0}")]
    MalformedHeader(&'static str),

    #[error("Failed to authenticate: {0}")]
    Verification(#[from] jsonwebtoken::errors::Error),

    #[error("Expected {expected} token, got {found} token")]
    WrongKind { expected: TokenKind, found: TokenKind },

    #[error("Token has been revoked")]
    Revoked,

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Signing secret is empty")]
    InvalidSecret,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Stateless signer/verifier bound to one secret and expiry policy.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            access_ttl,
            refresh_ttl,
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, AuthError> {
        Self::new(
            &security.jwt_secret,
            Duration::seconds(security.access_token_ttl_secs),
            Duration::seconds(security.refresh_token_ttl_secs),
        )
    }

    /// Short-lived token for ordinary API calls.
    pub fn issue_access_token(&self, user_id: Uuid, admin: bool) -> Result<String, AuthError> {
        self.issue(user_id, admin, TokenKind::Access)
    }

    /// Long-lived token that can only mint access tokens or be revoked.
    pub fn issue_refresh_token(&self, user_id: Uuid, admin: bool) -> Result<String, AuthError> {
        self.issue(user_id, admin, TokenKind::Refresh)
    }

    pub fn issue_pair(&self, user_id: Uuid, admin: bool) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user_id, admin)?,
            refresh_token: self.issue_refresh_token(user_id, admin)?,
        })
    }

    fn issue(&self, user_id: Uuid, admin: bool, kind: TokenKind) -> Result<String, AuthError> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            sub: user_id,
            admin,
            refresh: kind == TokenKind::Refresh,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Checks signature and expiry. Kind and revocation are the guard's job.
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        let claims = data.claims;

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| jsonwebtoken::errors::Error::from(ErrorKind::InvalidToken))?;

        Ok(VerifiedToken {
            user_id: claims.sub,
            admin: claims.admin,
            kind: TokenKind::from_refresh_flag(claims.refresh),
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new("test-secret", Duration::hours(1), Duration::days(365)).unwrap()
    }

    #[test]
    fn access_and_refresh_tokens_carry_their_kind() {
        let codec = codec();
        let user_id = Uuid::new_v4();

        let access = codec.verify(&codec.issue_access_token(user_id, true).unwrap()).unwrap();
        assert_eq!(access.kind, TokenKind::Access);
        assert_eq!(access.user_id, user_id);
        assert!(access.admin);

        let refresh = codec.verify(&codec.issue_refresh_token(user_id, false).unwrap()).unwrap();
        assert_eq!(refresh.kind, TokenKind::Refresh);
        assert!(!refresh.admin);
    }

    #[test]
    fn expiry_follows_token_kind() {
        let codec = codec();
        let pair = codec.issue_pair(Uuid::new_v4(), false).unwrap();
        let now = Utc::now();

        let access = codec.verify(&pair.access_token).unwrap();
        let refresh = codec.verify(&pair.refresh_token).unwrap();

        assert!(access.expires_at <= now + Duration::hours(1) + Duration::seconds(1));
        assert!(access.expires_at > now + Duration::minutes(59));
        assert!(refresh.expires_at > now + Duration::days(364));
    }

    #[test]
    fn tokens_issued_back_to_back_differ() {
        let codec = codec();
        let user_id = Uuid::new_v4();
        let a = codec.issue_access_token(user_id, false).unwrap();
        let b = codec.issue_access_token(user_id, false).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_expired_token() {
        let expired = TokenCodec::new("test-secret", Duration::hours(-2), Duration::hours(-2)).unwrap();
        let token = expired.issue_access_token(Uuid::new_v4(), false).unwrap();

        let err = codec().verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::Verification(_)));
    }

    #[test]
    fn rejects_foreign_signature_and_garbage() {
        let other = TokenCodec::new("other-secret", Duration::hours(1), Duration::days(1)).unwrap();
        let token = other.issue_access_token(Uuid::new_v4(), false).unwrap();

        assert!(matches!(codec().verify(&token), Err(AuthError::Verification(_))));
        assert!(matches!(codec().verify("not.a.jwt"), Err(AuthError::Verification(_))));
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(
            TokenCodec::new("", Duration::hours(1), Duration::days(1)),
            Err(AuthError::InvalidSecret)
        ));
    }
}
