use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use auth::JwtError;
use auth::SessionClaims;
use chrono::Utc;

use crate::account::errors::AuthError;
use crate::account::errors::StoreError;
use crate::account::models::timestamp_to_datetime;
use crate::account::models::AuthenticatedSession;
use crate::account::models::EmailAddress;
use crate::account::models::IssuedToken;
use crate::account::models::Password;
use crate::account::models::RegisterCommand;
use crate::account::models::Role;
use crate::account::models::User;
use crate::account::models::UserId;
use crate::account::ports::AuthServicePort;
use crate::account::ports::CredentialStore;
use crate::account::revocation::RevocationRegistry;
use crate::account::revocation::RevocationSweeper;

const BEARER_PREFIX: &str = "Bearer ";

/// Session lifecycle settings of the service.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    /// Period of the background revocation sweep
    pub sweep_interval: Duration,

    /// Revoke every existing session of a user when they reset their password
    pub revoke_sessions_on_password_reset: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(300),
            revoke_sessions_on_password_reset: false,
        }
    }
}

/// Domain service implementation for account and session operations.
///
/// Owns the revocation registry and its sweeper; the sweeper starts here and
/// stops when the service is dropped. Must be constructed inside a Tokio
/// runtime for the sweeper to run.
pub struct AuthService<CS>
where
    CS: CredentialStore,
{
    store: Arc<CS>,
    authenticator: Arc<Authenticator>,
    revocations: RevocationRegistry,
    sweeper: RevocationSweeper,
    policy: SessionPolicy,
}

impl<CS> AuthService<CS>
where
    CS: CredentialStore,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `store` - User persistence implementation
    /// * `authenticator` - Password hashing and token signing
    /// * `policy` - Sweep period and reset behaviour
    pub fn new(store: Arc<CS>, authenticator: Arc<Authenticator>, policy: SessionPolicy) -> Self {
        let revocations = RevocationRegistry::new();
        let sweeper = RevocationSweeper::start(revocations.clone(), policy.sweep_interval);

        Self {
            store,
            authenticator,
            revocations,
            sweeper,
            policy,
        }
    }

    /// Handle to the revocation registry.
    pub fn revocations(&self) -> &RevocationRegistry {
        &self.revocations
    }

    fn session_from_claims(claims: SessionClaims) -> Result<AuthenticatedSession, AuthError> {
        let user_id =
            UserId::from_string(&claims.user_id).map_err(|_| AuthError::InvalidSignature)?;
        let role = claims
            .role
            .parse::<Role>()
            .map_err(|_| AuthError::InvalidSignature)?;

        Ok(AuthenticatedSession {
            user_id,
            email: claims.email,
            role,
            issued_at: timestamp_to_datetime(claims.iat),
            expires_at: timestamp_to_datetime(claims.exp),
        })
    }
}

fn strip_bearer(token: &str) -> &str {
    token.strip_prefix(BEARER_PREFIX).unwrap_or(token)
}

#[async_trait]
impl<CS> AuthServicePort for AuthService<CS>
where
    CS: CredentialStore,
{
    async fn register(&self, command: RegisterCommand) -> Result<User, AuthError> {
        if self.store.exists_by_email(&command.email).await? {
            return Err(AuthError::DuplicateCredential(format!(
                "email already registered: {}",
                command.email
            )));
        }

        let password_hash = self
            .authenticator
            .hash_password(command.password.expose())
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))?;

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            username: command.username,
            email: command.email,
            password_hash,
            role: Role::User,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let created_user = self.store.create(user).await?;
        tracing::info!(user_id = %created_user.id, "User registered");

        Ok(created_user)
    }

    async fn login(&self, email: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let email = EmailAddress::new(email.to_string()).map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let result = self
            .authenticator
            .authenticate(
                password,
                &user.password_hash,
                &user.id.to_string(),
                user.email.as_str(),
                user.role.as_str(),
            )
            .map_err(|e| match e {
                AuthenticationError::InvalidCredentials => AuthError::InvalidCredentials,
                AuthenticationError::PasswordError(err) => {
                    AuthError::Internal(format!("Password verification failed: {}", err))
                }
                AuthenticationError::JwtError(err) => {
                    AuthError::Internal(format!("Token generation failed: {}", err))
                }
            })?;

        tracing::info!(user_id = %user.id, "Session issued");

        Ok(IssuedToken::new(result.access_token, result.claims.exp))
    }

    async fn logout(&self, token: &str) -> Result<(), AuthError> {
        let token = strip_bearer(token);

        let claims = self.authenticator.validate_session(token).map_err(|e| {
            tracing::debug!(error = %e, "Logout with unusable token");
            AuthError::InvalidToken
        })?;

        self.revocations.revoke(token, claims.exp).await;
        self.sweeper.trigger();

        tracing::info!(user_id = %claims.user_id, "Session revoked");
        Ok(())
    }

    async fn verify_token(&self, token: &str) -> Result<AuthenticatedSession, AuthError> {
        let token = strip_bearer(token);

        if self.revocations.is_revoked(token).await {
            return Err(AuthError::TokenRevoked);
        }

        let claims = self
            .authenticator
            .validate_session(token)
            .map_err(|e| match e {
                JwtError::TokenExpired => AuthError::TokenExpired,
                other => {
                    tracing::debug!(error = %other, "Session token rejected");
                    AuthError::InvalidSignature
                }
            })?;

        let issued_at_us = claims.iat_us;
        let session = Self::session_from_claims(claims)?;

        if self
            .revocations
            .is_session_cut_off(&session.user_id, issued_at_us)
            .await
        {
            return Err(AuthError::TokenRevoked);
        }

        if !self.store.exists_by_id(&session.user_id).await? {
            return Err(AuthError::UserNotFound(session.user_id.to_string()));
        }

        Ok(session)
    }

    async fn request_password_reset(&self, email: &str) -> Result<IssuedToken, AuthError> {
        let not_found = || AuthError::UserNotFound(email.to_string());

        let address = EmailAddress::new(email.to_string()).map_err(|_| not_found())?;
        let user = self
            .store
            .find_by_email(&address)
            .await?
            .ok_or_else(not_found)?;

        let (token, claims) = self
            .authenticator
            .issue_password_reset(&user.id.to_string(), user.email.as_str())
            .map_err(|e| AuthError::Internal(format!("Token generation failed: {}", e)))?;

        tracing::info!(user_id = %user.id, "Password reset token issued");

        Ok(IssuedToken::new(token, claims.exp))
    }

    async fn reset_password(&self, token: &str, new_password: Password) -> Result<(), AuthError> {
        let claims = self
            .authenticator
            .validate_password_reset(token)
            .map_err(|e| match e {
                JwtError::InvalidPurpose { .. } => AuthError::InvalidTokenPurpose,
                other => {
                    tracing::debug!(error = %other, "Reset token rejected");
                    AuthError::InvalidOrExpiredToken
                }
            })?;

        let user_id =
            UserId::from_string(&claims.user_id).map_err(|_| AuthError::InvalidOrExpiredToken)?;

        let password_hash = self
            .authenticator
            .hash_password(new_password.expose())
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))?;

        let now = Utc::now();
        self.store
            .update_password(&user_id, &password_hash, now)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(id) => AuthError::UserNotFound(id),
                other => AuthError::from(other),
            })?;

        if self.policy.revoke_sessions_on_password_reset {
            let session_ttl = self.authenticator.session_ttl().num_seconds();
            self.revocations
                .revoke_sessions_before(
                    user_id,
                    now.timestamp_micros(),
                    now.timestamp() + session_ttl,
                )
                .await;
            tracing::info!(user_id = %user_id, "Existing sessions revoked after password reset");
        }

        tracing::info!(user_id = %user_id, "Password reset");
        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> Result<User, AuthError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AuthError::UserNotFound(id.to_string()))
    }

    async fn list_users(&self, limit: u32, offset: u32) -> Result<Vec<User>, AuthError> {
        Ok(self.store.list(limit, offset).await?)
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), AuthError> {
        self.store
            .soft_delete(id, Utc::now())
            .await
            .map_err(|e| match e {
                StoreError::NotFound(id) => AuthError::UserNotFound(id),
                other => AuthError::from(other),
            })?;

        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use auth::JwtHandler;
    use auth::PasswordHasher;
    use chrono::DateTime;
    use mockall::mock;

    use super::*;

    const SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

    mock! {
        pub TestCredentialStore {}

        #[async_trait]
        impl CredentialStore for TestCredentialStore {
            async fn create(&self, user: User) -> Result<User, StoreError>;
            async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, StoreError>;
            async fn exists_by_email(&self, email: &EmailAddress) -> Result<bool, StoreError>;
            async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError>;
            async fn exists_by_id(&self, id: &UserId) -> Result<bool, StoreError>;
            async fn update_password(&self, id: &UserId, password_hash: &str, updated_at: DateTime<Utc>) -> Result<(), StoreError>;
            async fn list(&self, limit: u32, offset: u32) -> Result<Vec<User>, StoreError>;
            async fn soft_delete(&self, id: &UserId, deleted_at: DateTime<Utc>) -> Result<(), StoreError>;
        }
    }

    fn authenticator() -> Arc<Authenticator> {
        Arc::new(
            Authenticator::new(SECRET)
                .unwrap()
                .with_password_hasher(PasswordHasher::with_cost(8, 1).unwrap()),
        )
    }

    fn service(store: MockTestCredentialStore) -> AuthService<MockTestCredentialStore> {
        AuthService::new(Arc::new(store), authenticator(), SessionPolicy::default())
    }

    fn alice(password: &str) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(),
            username: crate::account::models::Username::new("alice".to_string()).unwrap(),
            email: EmailAddress::new("alice@x.com".to_string()).unwrap(),
            password_hash: authenticator().hash_password(password).unwrap(),
            role: Role::User,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn register_command() -> RegisterCommand {
        RegisterCommand::new(
            crate::account::models::Username::new("alice".to_string()).unwrap(),
            EmailAddress::new("alice@x.com".to_string()).unwrap(),
            Password::new("secret1".to_string()).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_register_success() {
        let mut store = MockTestCredentialStore::new();

        store
            .expect_exists_by_email()
            .times(1)
            .returning(|_| Ok(false));
        store
            .expect_create()
            .withf(|user| {
                user.username.as_str() == "alice"
                    && user.role == Role::User
                    && user.password_hash.starts_with("$argon2id$")
            })
            .times(1)
            .returning(|user| Ok(user));

        let user = service(store).register(register_command()).await.unwrap();

        assert_eq!(user.email.as_str(), "alice@x.com");
        assert!(user.deleted_at.is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let mut store = MockTestCredentialStore::new();

        store
            .expect_exists_by_email()
            .times(1)
            .returning(|_| Ok(true));
        store.expect_create().times(0);

        let result = service(store).register(register_command()).await;
        assert!(matches!(result, Err(AuthError::DuplicateCredential(_))));
    }

    #[tokio::test]
    async fn test_register_store_race_is_conflict() {
        let mut store = MockTestCredentialStore::new();

        store
            .expect_exists_by_email()
            .returning(|_| Ok(false));
        store
            .expect_create()
            .returning(|user| Err(StoreError::DuplicateUsername(user.username.to_string())));

        let result = service(store).register(register_command()).await;
        assert!(matches!(result, Err(AuthError::DuplicateCredential(_))));
    }

    #[tokio::test]
    async fn test_register_store_failure_passes_through() {
        let mut store = MockTestCredentialStore::new();

        store
            .expect_exists_by_email()
            .returning(|_| Err(StoreError::Database("connection refused".to_string())));

        let result = service(store).register(register_command()).await;
        assert!(matches!(
            result,
            Err(AuthError::Store(StoreError::Database(_)))
        ));
    }

    #[tokio::test]
    async fn test_login_unknown_email_and_wrong_password_are_indistinguishable() {
        let user = alice("secret1");
        let mut store = MockTestCredentialStore::new();
        store.expect_find_by_email().returning(move |email| {
            if email.as_str() == "alice@x.com" {
                Ok(Some(user.clone()))
            } else {
                Ok(None)
            }
        });
        let service = service(store);

        let unknown = service.login("bob@x.com", "secret1").await.unwrap_err();
        let wrong = service.login("alice@x.com", "wrong").await.unwrap_err();
        let malformed = service.login("not-an-email", "secret1").await.unwrap_err();

        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(malformed, AuthError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_login_issues_24h_session() {
        let user = alice("secret1");
        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let issued = service(store).login("alice@x.com", "secret1").await.unwrap();

        let claims = authenticator().validate_session(&issued.token).unwrap();
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
        assert_eq!(claims.role, "user");
        assert_eq!(issued.expires_at.timestamp(), claims.exp);
    }

    #[tokio::test]
    async fn test_verify_deleted_user() {
        let user = alice("secret1");
        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        store.expect_exists_by_id().times(1).returning(|_| Ok(false));
        let service = service(store);

        let issued = service.login("alice@x.com", "secret1").await.unwrap();
        let result = service.verify_token(&issued.token).await;

        assert!(matches!(result, Err(AuthError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_verify_revoked_skips_store() {
        let user = alice("secret1");
        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        store.expect_exists_by_id().times(0);
        let service = service(store);

        let issued = service.login("alice@x.com", "secret1").await.unwrap();
        service.logout(&format!("Bearer {}", issued.token)).await.unwrap();

        let result = service.verify_token(&issued.token).await;
        assert!(matches!(result, Err(AuthError::TokenRevoked)));
    }

    #[tokio::test]
    async fn test_verify_expired() {
        let store = MockTestCredentialStore::new();
        let service = service(store);

        let claims = SessionClaims::new(
            UserId::new(),
            "alice@x.com",
            "user",
            Utc::now() - chrono::Duration::hours(25),
            chrono::Duration::hours(24),
        );
        let token = JwtHandler::new(SECRET).unwrap().encode(&claims).unwrap();

        let result = service.verify_token(&token).await;
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[tokio::test]
    async fn test_verify_foreign_signature() {
        let service = service(MockTestCredentialStore::new());

        let claims = SessionClaims::new(
            UserId::new(),
            "alice@x.com",
            "user",
            Utc::now(),
            chrono::Duration::hours(24),
        );
        let token = JwtHandler::new(b"some-other-secret")
            .unwrap()
            .encode(&claims)
            .unwrap();

        let result = service.verify_token(&token).await;
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[tokio::test]
    async fn test_verify_unknown_role_is_rejected() {
        let service = service(MockTestCredentialStore::new());

        let claims = SessionClaims::new(
            UserId::new(),
            "alice@x.com",
            "superuser",
            Utc::now(),
            chrono::Duration::hours(24),
        );
        let token = JwtHandler::new(SECRET).unwrap().encode(&claims).unwrap();

        let result = service.verify_token(&token).await;
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[tokio::test]
    async fn test_logout_rejects_garbage() {
        let service = service(MockTestCredentialStore::new());

        let result = service.logout("Bearer not.a.token").await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
        assert!(service.revocations().is_empty().await);
    }

    #[tokio::test]
    async fn test_request_password_reset_unknown_email() {
        let mut store = MockTestCredentialStore::new();
        store.expect_find_by_email().returning(|_| Ok(None));

        let result = service(store).request_password_reset("bob@x.com").await;
        assert!(matches!(result, Err(AuthError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_reset_password_updates_hash() {
        let user = alice("secret1");
        let user_id = user.id;
        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        store
            .expect_update_password()
            .withf(move |id, hash, _| *id == user_id && hash.starts_with("$argon2id$"))
            .times(1)
            .returning(|_, _, _| Ok(()));
        let service = service(store);

        let reset = service.request_password_reset("alice@x.com").await.unwrap();
        let result = service
            .reset_password(&reset.token, Password::new("newpass1".to_string()).unwrap())
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_reset_password_vanished_user() {
        let user = alice("secret1");
        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        store
            .expect_update_password()
            .returning(|id, _, _| Err(StoreError::NotFound(id.to_string())));
        let service = service(store);

        let reset = service.request_password_reset("alice@x.com").await.unwrap();
        let result = service
            .reset_password(&reset.token, Password::new("newpass1".to_string()).unwrap())
            .await;

        assert!(matches!(result, Err(AuthError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_reset_password_with_session_token() {
        let user = alice("secret1");
        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        store.expect_update_password().times(0);
        let service = service(store);

        let session = service.login("alice@x.com", "secret1").await.unwrap();
        let result = service
            .reset_password(&session.token, Password::new("newpass1".to_string()).unwrap())
            .await;

        assert!(matches!(result, Err(AuthError::InvalidTokenPurpose)));
    }

    #[tokio::test]
    async fn test_reset_password_with_garbage() {
        let service = service(MockTestCredentialStore::new());

        let result = service
            .reset_password("garbage", Password::new("newpass1".to_string()).unwrap())
            .await;

        assert!(matches!(result, Err(AuthError::InvalidOrExpiredToken)));
    }

    #[tokio::test]
    async fn test_delete_unknown_user() {
        let mut store = MockTestCredentialStore::new();
        store
            .expect_soft_delete()
            .returning(|id, _| Err(StoreError::NotFound(id.to_string())));

        let result = service(store).delete_user(&UserId::new()).await;
        assert!(matches!(result, Err(AuthError::UserNotFound(_))));
    }

    #[test]
    fn test_strip_bearer() {
        assert_eq!(strip_bearer("Bearer abc"), "abc");
        assert_eq!(strip_bearer("abc"), "abc");
        assert_eq!(strip_bearer("bearer abc"), "bearer abc");
    }
}
