use thiserror::Error;

/// Error type for JWT operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Signing secret must not be empty")]
    EmptySecret,

    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Token signature is invalid: {0}")]
    InvalidSignature(String),

    #[error("Token is expired")]
    TokenExpired,

    #[error("Missing required claim: {0}")]
    MissingClaim(String),

    #[error("Token purpose mismatch: expected {expected}, found {found:?}")]
    InvalidPurpose {
        expected: String,
        found: Option<String>,
    },
}
