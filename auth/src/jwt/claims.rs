use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Purpose tag restricting a token to a single operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    PasswordReset,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::PasswordReset => "password_reset",
        }
    }
}

impl fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenPurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "password_reset" => Ok(TokenPurpose::PasswordReset),
            other => Err(format!("unknown token purpose: {}", other)),
        }
    }
}

/// Claims carried by a session (bearer) token.
///
/// Unknown fields are refused so that tokens minted for another purpose
/// never decode as a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SessionClaims {
    /// Identifier of the authenticated user
    pub user_id: String,

    /// Email of the user at issuance time
    pub email: String,

    /// Role name (`user` or `admin`)
    pub role: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Issued at, in microseconds since the epoch; orders sessions against
    /// revocation cutoffs taken within the same second
    pub iat_us: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Unique token identifier
    pub jti: String,
}

impl SessionClaims {
    /// Create session claims issued at `issued_at` and valid for `ttl`.
    ///
    /// # Arguments
    /// * `user_id` - Unique user identifier
    /// * `email` - User email address
    /// * `role` - Role name
    /// * `issued_at` - Issuance instant
    /// * `ttl` - Token lifetime
    ///
    /// # Returns
    /// Claims with `exp == iat + ttl` and a random `jti`
    pub fn new(
        user_id: impl ToString,
        email: impl Into<String>,
        role: impl Into<String>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let iat = issued_at.timestamp();
        Self {
            user_id: user_id.to_string(),
            email: email.into(),
            role: role.into(),
            iat,
            iat_us: issued_at.timestamp_micros(),
            exp: iat + ttl.num_seconds(),
            jti: Uuid::new_v4().to_string(),
        }
    }
}

/// Claims carried by a password-reset token.
///
/// `purpose` is optional on the wire so that a token lacking it decodes and
/// can be rejected for its purpose rather than for its shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PasswordResetClaims {
    pub user_id: String,
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,

    pub iat: i64,
    pub exp: i64,
}

impl PasswordResetClaims {
    /// Create reset claims issued at `issued_at` and valid for `ttl`.
    pub fn new(
        user_id: impl ToString,
        email: impl Into<String>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let iat = issued_at.timestamp();
        Self {
            user_id: user_id.to_string(),
            email: email.into(),
            purpose: Some(TokenPurpose::PasswordReset.as_str().to_string()),
            iat,
            exp: iat + ttl.num_seconds(),
        }
    }

    /// Parsed purpose tag, if present and known.
    pub fn purpose(&self) -> Option<TokenPurpose> {
        self.purpose.as_deref().and_then(|p| p.parse().ok())
    }
}
