use thiserror::Error;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for Username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Username too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error(
        "Username contains invalid characters (only alphanumeric, underscore, and hyphen allowed)"
    )]
    InvalidCharacters,
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for password policy violations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Password too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },
}

/// Error for Role parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoleError {
    #[error("Unknown role: {0}")]
    Unknown(String),
}

/// Failures reported by a credential store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Email already exists: {0}")]
    DuplicateEmail(String),

    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Stored record is invalid: {0}")]
    CorruptRecord(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Coarse classification of [`AuthError`], used by adapters to pick a
/// response without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed input, fixable by the caller
    Validation,
    /// Credentials or token rejected
    Authentication,
    /// Credential already taken
    Conflict,
    /// Referenced user does not exist
    NotFound,
    /// Credential store failure, passed through unchanged
    Store,
    /// Hashing or signing failure
    Internal,
}

/// Top-level error for all account and session operations
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid user ID: {0}")]
    InvalidUserId(#[from] UserIdError),

    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid password: {0}")]
    InvalidPassword(#[from] PasswordPolicyError),

    // Conflicts
    #[error("Duplicate credential: {0}")]
    DuplicateCredential(String),

    // Authentication failures
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has been revoked")]
    TokenRevoked,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid or expired reset token")]
    InvalidOrExpiredToken,

    #[error("Invalid token purpose")]
    InvalidTokenPurpose,

    #[error("User not found: {0}")]
    UserNotFound(String),

    // Infrastructure errors
    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AuthError::InvalidUserId(_)
            | AuthError::InvalidUsername(_)
            | AuthError::InvalidEmail(_)
            | AuthError::InvalidPassword(_) => ErrorCategory::Validation,
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::TokenRevoked
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::InvalidOrExpiredToken
            | AuthError::InvalidTokenPurpose => ErrorCategory::Authentication,
            AuthError::DuplicateCredential(_) => ErrorCategory::Conflict,
            AuthError::UserNotFound(_) => ErrorCategory::NotFound,
            AuthError::Store(_) => ErrorCategory::Store,
            AuthError::Internal(_) => ErrorCategory::Internal,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail(email) => {
                AuthError::DuplicateCredential(format!("email already registered: {}", email))
            }
            StoreError::DuplicateUsername(username) => {
                AuthError::DuplicateCredential(format!("username already taken: {}", username))
            }
            other => AuthError::Store(other),
        }
    }
}
