use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::account::errors::AuthError;
use crate::account::errors::StoreError;
use crate::account::models::AuthenticatedSession;
use crate::account::models::EmailAddress;
use crate::account::models::IssuedToken;
use crate::account::models::Password;
use crate::account::models::RegisterCommand;
use crate::account::models::User;
use crate::account::models::UserId;

/// Port for account and session operations.
///
/// Every token argument accepts an optional `"Bearer "` prefix except
/// `reset_password`, whose token arrives in a request body.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new user with role `user`.
    ///
    /// # Errors
    /// * `DuplicateCredential` - Email (or username) already registered
    /// * `Store` - Credential store failed
    async fn register(&self, command: RegisterCommand) -> Result<User, AuthError>;

    /// Check credentials and issue a session token.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password, indistinguishably
    async fn login(&self, email: &str, password: &str) -> Result<IssuedToken, AuthError>;

    /// Revoke a session token until its natural expiry.
    ///
    /// # Errors
    /// * `InvalidToken` - Signature, structure or expiry check failed
    async fn logout(&self, token: &str) -> Result<(), AuthError>;

    /// Verify a session token and return the identity it carries.
    ///
    /// # Errors
    /// * `TokenRevoked` - Token was logged out, or predates a password reset
    /// * `InvalidSignature` - Signature, algorithm or claim shape rejected
    /// * `TokenExpired` - Token is past its expiry
    /// * `UserNotFound` - Referenced user no longer exists
    async fn verify_token(&self, token: &str) -> Result<AuthenticatedSession, AuthError>;

    /// Issue a password-reset token for the account with this email.
    ///
    /// # Errors
    /// * `UserNotFound` - No account with this email
    async fn request_password_reset(&self, email: &str) -> Result<IssuedToken, AuthError>;

    /// Redeem a password-reset token and replace the stored password hash.
    ///
    /// # Errors
    /// * `InvalidOrExpiredToken` - Signature or expiry check failed
    /// * `InvalidTokenPurpose` - Token is not a password-reset token
    /// * `UserNotFound` - Referenced user no longer exists
    async fn reset_password(&self, token: &str, new_password: Password) -> Result<(), AuthError>;

    /// Retrieve a user by identifier.
    ///
    /// # Errors
    /// * `UserNotFound` - User does not exist
    async fn get_user(&self, id: &UserId) -> Result<User, AuthError>;

    /// Retrieve a page of users ordered by creation time.
    async fn list_users(&self, limit: u32, offset: u32) -> Result<Vec<User>, AuthError>;

    /// Soft-delete a user. Outstanding tokens of that user stop verifying.
    ///
    /// # Errors
    /// * `UserNotFound` - User does not exist
    async fn delete_user(&self, id: &UserId) -> Result<(), AuthError>;
}

/// Persistence operations for user records.
///
/// Soft-deleted users are invisible to every lookup.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Persist a new user.
    ///
    /// # Errors
    /// * `DuplicateEmail` / `DuplicateUsername` - Unique constraint violated
    /// * `Database` - Storage failure
    async fn create(&self, user: User) -> Result<User, StoreError>;

    /// Retrieve user by email address.
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, StoreError>;

    /// Check whether a user with this email exists.
    async fn exists_by_email(&self, email: &EmailAddress) -> Result<bool, StoreError>;

    /// Retrieve user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError>;

    /// Check whether a user with this identifier exists.
    async fn exists_by_id(&self, id: &UserId) -> Result<bool, StoreError>;

    /// Replace the stored password hash.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn update_password(
        &self,
        id: &UserId,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Retrieve a page of users ordered by creation time.
    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<User>, StoreError>;

    /// Mark a user as deleted.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    async fn soft_delete(&self, id: &UserId, deleted_at: DateTime<Utc>)
        -> Result<(), StoreError>;
}
