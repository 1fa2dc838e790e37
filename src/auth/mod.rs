//! Caller identity.
//!
//! Requests carry `Authorization: Bearer <token>` where the token is
//! `base64url(claims json) "." base64url(HMAC-SHA256(secret, first segment))`.
//! Signing and verification are pure functions of the secret and payload.

pub mod extract;
pub mod tickets;

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    CargoOwner,
    Transporter,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::CargoOwner => "cargo_owner",
            Role::Transporter => "transporter",
            Role::Staff => "staff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated caller, resolved once per request and passed into every
/// engine operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_staff(&self) -> bool {
        self.role == Role::Staff
    }

    pub fn require_role(&self, role: Role, action: &str) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "only a {role} can {action}, caller is a {}",
                self.role
            )))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    /// Expiry as unix seconds.
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, role: Role, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: user_id,
            role,
            exp: (now + ttl).timestamp(),
        }
    }
}

impl From<Claims> for Actor {
    fn from(claims: Claims) -> Self {
        Actor::new(claims.sub, claims.role)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature does not match")]
    BadSignature,

    #[error("token has expired")]
    Expired,

    #[error("failed to encode claims: {0}")]
    Encoding(String),
}

pub fn sign(secret: &[u8], claims: &Claims) -> Result<String, AuthError> {
    let payload = serde_json::to_vec(claims).map_err(|err| AuthError::Encoding(err.to_string()))?;
    let encoded = URL_SAFE_NO_PAD.encode(payload);
    let signature = mac(secret, encoded.as_bytes())?;

    Ok(format!("{encoded}.{}", URL_SAFE_NO_PAD.encode(signature)))
}

pub fn verify(secret: &[u8], token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
    let (encoded, signature) = token.split_once('.').ok_or(AuthError::Malformed)?;

    let provided = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| AuthError::Malformed)?;
    let expected = mac(secret, encoded.as_bytes())?;
    if !bool::from(expected.as_slice().ct_eq(provided.as_slice())) {
        return Err(AuthError::BadSignature);
    }

    let payload = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| AuthError::Malformed)?;
    let claims: Claims = serde_json::from_slice(&payload).map_err(|_| AuthError::Malformed)?;

    if claims.exp <= now.timestamp() {
        return Err(AuthError::Expired);
    }

    Ok(claims)
}

fn mac(secret: &[u8], message: &[u8]) -> Result<Vec<u8>, AuthError> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret)
        .map_err(|err| AuthError::Encoding(err.to_string()))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::{sign, verify, Actor, AuthError, Claims, Role};

    const SECRET: &[u8] = b"test-secret-of-sufficient-length";

    #[test]
    fn signed_token_verifies_back_to_claims() {
        let now = Utc::now();
        let claims = Claims::new(Uuid::new_v4(), Role::Transporter, now, Duration::hours(1));
        let token = sign(SECRET, &claims).unwrap();

        let verified = verify(SECRET, &token, now).unwrap();
        assert_eq!(verified, claims);
        assert_eq!(Actor::from(verified).role, Role::Transporter);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let now = Utc::now();
        let claims = Claims::new(Uuid::new_v4(), Role::CargoOwner, now, Duration::hours(1));
        let token = sign(b"another-secret-entirely", &claims).unwrap();

        assert_eq!(verify(SECRET, &token, now), Err(AuthError::BadSignature));
    }

    #[test]
    fn tampered_role_is_rejected() {
        let now = Utc::now();
        let claims = Claims::new(Uuid::new_v4(), Role::Transporter, now, Duration::hours(1));
        let token = sign(SECRET, &claims).unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let forged = Claims {
            role: Role::Staff,
            ..claims
        };
        let forged_token = sign(b"attacker", &forged).unwrap();
        let (forged_payload, _) = forged_token.split_once('.').unwrap();

        let spliced = format!("{forged_payload}.{signature}");
        assert_eq!(verify(SECRET, &spliced, now), Err(AuthError::BadSignature));
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now();
        let claims = Claims::new(Uuid::new_v4(), Role::Staff, now, Duration::seconds(30));
        let token = sign(SECRET, &claims).unwrap();

        assert_eq!(
            verify(SECRET, &token, now + Duration::minutes(5)),
            Err(AuthError::Expired)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(verify(SECRET, "not-a-token", Utc::now()), Err(AuthError::Malformed));
    }

    #[test]
    fn require_role_names_both_roles() {
        let actor = Actor::new(Uuid::new_v4(), Role::CargoOwner);
        let err = actor
            .require_role(Role::Transporter, "submit offers")
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("transporter"));
        assert!(message.contains("cargo_owner"));
    }
}
