use chrono::Duration;
use chrono::Utc;

use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::jwt::PasswordResetClaims;
use crate::jwt::SessionClaims;
use crate::jwt::TokenPurpose;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining password verification, token
/// signing and the lifetimes of the two token kinds.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    jwt_handler: JwtHandler,
    session_ttl: Duration,
    reset_ttl: Duration,
}

/// Result of successful authentication.
#[derive(Debug, Clone)]
pub struct AuthenticationResult {
    /// Signed session token
    pub access_token: String,

    /// Claims encoded in `access_token`
    pub claims: SessionClaims,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;
    pub const DEFAULT_RESET_TTL_MINUTES: i64 = 60;

    /// Create a new authenticator with default lifetimes (24h sessions, 1h
    /// reset tokens) and default Argon2id cost.
    ///
    /// # Errors
    /// * `EmptySecret` - `jwt_secret` is empty
    pub fn new(jwt_secret: &[u8]) -> Result<Self, JwtError> {
        Ok(Self {
            password_hasher: PasswordHasher::new(),
            jwt_handler: JwtHandler::new(jwt_secret)?,
            session_ttl: Duration::hours(Self::DEFAULT_SESSION_TTL_HOURS),
            reset_ttl: Duration::minutes(Self::DEFAULT_RESET_TTL_MINUTES),
        })
    }

    /// Set the session token lifetime.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Set the password-reset token lifetime.
    pub fn with_reset_ttl(mut self, ttl: Duration) -> Self {
        self.reset_ttl = ttl;
        self
    }

    /// Replace the password hasher (e.g. with a cheaper cost in tests).
    pub fn with_password_hasher(mut self, password_hasher: PasswordHasher) -> Self {
        self.password_hasher = password_hasher;
        self
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub fn reset_ttl(&self) -> Duration {
        self.reset_ttl
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify credentials and issue a session token.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored password hash
    /// * `user_id` - Identifier written into the token
    /// * `email` - Email written into the token
    /// * `role` - Role written into the token
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Stored hash could not be used
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        user_id: &str,
        email: &str,
        role: &str,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        if !self.password_hasher.verify(password, stored_hash)? {
            return Err(AuthenticationError::InvalidCredentials);
        }

        let claims = SessionClaims::new(user_id, email, role, Utc::now(), self.session_ttl);
        let access_token = self.jwt_handler.encode(&claims)?;

        Ok(AuthenticationResult {
            access_token,
            claims,
        })
    }

    /// Issue a password-reset token for a user.
    ///
    /// # Returns
    /// Signed token and its claims
    ///
    /// # Errors
    /// * `EncodingFailed` - Token generation failed
    pub fn issue_password_reset(
        &self,
        user_id: &str,
        email: &str,
    ) -> Result<(String, PasswordResetClaims), JwtError> {
        let claims = PasswordResetClaims::new(user_id, email, Utc::now(), self.reset_ttl);
        let token = self.jwt_handler.encode(&claims)?;
        Ok((token, claims))
    }

    /// Validate a session token and decode its claims.
    ///
    /// # Errors
    /// * `InvalidSignature` - Signature or algorithm rejected
    /// * `TokenExpired` - Token is past its `exp`
    /// * `Malformed` / `MissingClaim` - Not a session token
    pub fn validate_session(&self, token: &str) -> Result<SessionClaims, JwtError> {
        self.jwt_handler.decode(token)
    }

    /// Validate a password-reset token and check its purpose tag.
    ///
    /// Signature and expiry are checked before the purpose.
    ///
    /// # Errors
    /// * `InvalidSignature` / `TokenExpired` / `Malformed` / `MissingClaim`
    /// * `InvalidPurpose` - Token is well formed but not a reset token
    pub fn validate_password_reset(&self, token: &str) -> Result<PasswordResetClaims, JwtError> {
        let claims: PasswordResetClaims = self.jwt_handler.decode(token)?;

        match claims.purpose() {
            Some(TokenPurpose::PasswordReset) => Ok(claims),
            None => Err(JwtError::InvalidPurpose {
                expected: TokenPurpose::PasswordReset.to_string(),
                found: claims.purpose,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    fn authenticator() -> Authenticator {
        Authenticator::new(SECRET)
            .unwrap()
            .with_password_hasher(PasswordHasher::with_cost(8, 1).unwrap())
    }

    #[test]
    fn test_authenticate_success() {
        let authenticator = authenticator();

        let hash = authenticator
            .hash_password("my_password")
            .expect("Failed to hash password");

        let result = authenticator
            .authenticate("my_password", &hash, "user123", "alice@x.com", "user")
            .expect("Authentication failed");

        assert!(!result.access_token.is_empty());
        assert_eq!(result.claims.exp - result.claims.iat, 24 * 60 * 60);

        let decoded = authenticator
            .validate_session(&result.access_token)
            .expect("Token validation failed");
        assert_eq!(decoded, result.claims);
        assert_eq!(decoded.role, "user");
    }

    #[test]
    fn test_authenticate_invalid_password() {
        let authenticator = authenticator();

        let hash = authenticator.hash_password("my_password").unwrap();

        let result =
            authenticator.authenticate("wrong_password", &hash, "user123", "alice@x.com", "user");
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_reset_token_round_trip() {
        let authenticator = authenticator();

        let (token, claims) = authenticator
            .issue_password_reset("user123", "alice@x.com")
            .unwrap();
        assert_eq!(claims.exp - claims.iat, 60 * 60);

        let decoded = authenticator.validate_password_reset(&token).unwrap();
        assert_eq!(decoded.user_id, "user123");
        assert_eq!(decoded.purpose(), Some(TokenPurpose::PasswordReset));
    }

    #[test]
    fn test_session_token_is_not_a_reset_token() {
        let authenticator = authenticator();
        let hash = authenticator.hash_password("pw").unwrap();
        let session = authenticator
            .authenticate("pw", &hash, "user123", "alice@x.com", "user")
            .unwrap();

        let result = authenticator.validate_password_reset(&session.access_token);
        assert!(matches!(
            result,
            Err(JwtError::InvalidPurpose { found: None, .. })
        ));
    }

    #[test]
    fn test_reset_token_is_not_a_session_token() {
        let authenticator = authenticator();
        let (token, _) = authenticator
            .issue_password_reset("user123", "alice@x.com")
            .unwrap();

        let result = authenticator.validate_session(&token);
        assert!(matches!(result, Err(JwtError::Malformed(_))));
    }

    #[test]
    fn test_expired_reset_token() {
        let authenticator = authenticator().with_reset_ttl(Duration::seconds(-10));
        let (token, _) = authenticator
            .issue_password_reset("user123", "alice@x.com")
            .unwrap();

        let result = authenticator.validate_password_reset(&token);
        assert_eq!(result.unwrap_err(), JwtError::TokenExpired);
    }

    #[test]
    fn test_validate_invalid_token() {
        let authenticator = authenticator();

        let result = authenticator.validate_session("invalid.token.here");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_secret() {
        assert!(matches!(
            Authenticator::new(b""),
            Err(JwtError::EmptySecret)
        ));
    }
}
