//! Authentication utilities library
//!
//! Provides the credential primitives used by the auth service:
//! - Password hashing (Argon2id)
//! - Signed session and password-reset tokens (HS256 JWT)
//! - Authentication coordination with token lifetimes
//!
//! The library knows nothing about users or storage; the service adapts it
//! behind its own ports.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Session Tokens
//! ```
//! use auth::{JwtHandler, SessionClaims};
//! use chrono::{Duration, Utc};
//!
//! let handler = JwtHandler::new(b"secret_key_at_least_32_bytes_long!").unwrap();
//! let claims = SessionClaims::new("user123", "alice@x.com", "user", Utc::now(), Duration::hours(24));
//! let token = handler.encode(&claims).unwrap();
//! let decoded: SessionClaims = handler.decode(&token).unwrap();
//! assert_eq!(decoded, claims);
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::Authenticator;
//!
//! let auth = Authenticator::new(b"secret_key_at_least_32_bytes_long!").unwrap();
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and issue a session token
//! let result = auth
//!     .authenticate("password123", &hash, "user123", "alice@x.com", "user")
//!     .unwrap();
//!
//! // Validate token
//! let claims = auth.validate_session(&result.access_token).unwrap();
//! assert_eq!(claims.email, "alice@x.com");
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationResult;
pub use authenticator::Authenticator;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::PasswordResetClaims;
pub use jwt::SessionClaims;
pub use jwt::TokenPurpose;
pub use password::PasswordError;
pub use password::PasswordHasher;
