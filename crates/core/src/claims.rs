//! Session token claims and client-side validity checks.
//!
//! The client never holds the signing secret, so decoding here only checks
//! structure and the embedded expiry. The backend remains the authority on
//! signatures; a forged or stale token is caught there as a 401.

use std::collections::HashSet;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Claims the client relies on inside a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Display name chosen at login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Standard subject; used as the display name when `name` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Expiration time (UTC Unix timestamp, seconds).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp, seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl IdentityClaims {
    /// The identity to greet the user with, if the token carries one.
    pub fn display_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or(self.sub.as_deref())
            .filter(|name| !name.is_empty())
    }

    /// `true` while `now` (Unix seconds) is strictly before the expiry.
    pub fn is_live_at(&self, now: i64) -> bool {
        now < self.exp
    }
}

/// Decode the claims of `token` without verifying its signature.
///
/// Expiry is not enforced here; callers compare it against
/// their own clock via [`is_valid_at`].
pub fn decode_claims(token: &str) -> Result<IdentityClaims, CoreError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();

    decode::<IdentityClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| CoreError::Decode(e.to_string()))
}

/// A token is valid iff it decodes AND `now` is strictly before its expiry.
///
/// Decode failures degrade to `false`; they are never surfaced as errors.
pub fn is_valid_at(token: &str, now: i64) -> bool {
    match decode_claims(token) {
        Ok(claims) => claims.is_live_at(now),
        Err(_) => false,
    }
}

/// [`is_valid_at`] against the wall clock.
pub fn is_valid(token: &str) -> bool {
    is_valid_at(token, chrono::Utc::now().timestamp())
}

/// Best-effort display identity of `token`; `None` on any decode failure.
pub fn decode_identity(token: &str) -> Option<String> {
    decode_claims(token)
        .ok()
        .and_then(|claims| claims.display_name().map(str::to_string))
}
