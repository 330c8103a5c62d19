use std::sync::Arc;

use auth::Authenticator;
use auth::JwtHandler;
use auth::PasswordHasher;
use auth_service::account::ports::AuthServicePort;
use auth_service::config::RevocationConfig;
use auth_service::domain::account::models::EmailAddress;
use auth_service::domain::account::models::Role;
use auth_service::domain::account::models::User;
use auth_service::domain::account::models::UserId;
use auth_service::domain::account::models::Username;
use auth_service::domain::account::ports::CredentialStore;
use auth_service::domain::account::service::AuthService;
use auth_service::inbound::http::router::create_router;
use auth_service::outbound::repositories::InMemoryCredentialStore;
use chrono::Utc;
use serde_json::json;
use serde_json::Value;

pub const JWT_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Test application that spawns a real server over the in-memory store
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub store: Arc<InMemoryCredentialStore>,
    pub authenticator: Arc<Authenticator>,
    pub jwt_handler: JwtHandler,
}

/// Authenticator with a cheap Argon2 cost so the suites stay fast
pub fn test_authenticator() -> Authenticator {
    Authenticator::new(JWT_SECRET)
        .expect("Failed to create authenticator")
        .with_password_hasher(
            PasswordHasher::with_cost(8, 1).expect("Failed to create password hasher"),
        )
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        Self::spawn_with(RevocationConfig::default()).await
    }

    pub async fn spawn_with(revocation: RevocationConfig) -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let store = Arc::new(InMemoryCredentialStore::new());
        let authenticator = Arc::new(test_authenticator());

        let auth_service: Arc<dyn AuthServicePort> = Arc::new(AuthService::new(
            Arc::clone(&store),
            Arc::clone(&authenticator),
            revocation.session_policy(),
        ));

        let router = create_router(auth_service);

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            api_client: reqwest::Client::new(),
            store,
            authenticator,
            jwt_handler: JwtHandler::new(JWT_SECRET).expect("Failed to create JWT handler"),
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make POST request with Bearer token
    pub fn post_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.post(path).bearer_auth(token)
    }

    /// Helper to make DELETE request with Bearer token
    pub fn delete_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .delete(format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Register through the API and return the response body
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Value {
        let response = self
            .post("/api/auth/register")
            .json(&json!({
                "username": username,
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        response.json().await.expect("Failed to parse response")
    }

    /// Log in through the API and return the session token
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post("/api/auth/login")
            .json(&json!({
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: Value = response.json().await.expect("Failed to parse response");
        body["data"]["token"]
            .as_str()
            .expect("Missing token")
            .to_string()
    }

    /// Insert an admin directly into the store and return a session token for it
    pub async fn seed_admin(&self) -> String {
        let now = Utc::now();
        let admin = User {
            id: UserId::new(),
            username: Username::new("admin".to_string()).unwrap(),
            email: EmailAddress::new("admin@example.com".to_string()).unwrap(),
            password_hash: self.authenticator.hash_password("admin-pass").unwrap(),
            role: Role::Admin,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.store
            .create(admin)
            .await
            .expect("Failed to seed admin");

        self.login("admin@example.com", "admin-pass").await
    }
}
