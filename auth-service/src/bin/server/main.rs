use std::sync::Arc;

use auth::Authenticator;
use auth_service::config::Config;
use auth_service::domain::account::ports::AuthServicePort;
use auth_service::domain::account::service::AuthService;
use auth_service::inbound::http::router::create_router;
use auth_service::outbound::repositories::InMemoryCredentialStore;
use auth_service::outbound::repositories::PostgresCredentialStore;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "auth-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        session_ttl_hours = config.jwt.session_ttl_hours,
        reset_ttl_minutes = config.jwt.reset_ttl_minutes,
        sweep_interval_secs = config.revocation.sweep_interval_secs,
        revoke_sessions_on_password_reset = config.revocation.revoke_sessions_on_password_reset,
        "Configuration loaded"
    );

    let authenticator = Arc::new(
        Authenticator::new(config.jwt.secret.as_bytes())?
            .with_session_ttl(config.jwt.session_ttl()?)
            .with_reset_ttl(config.jwt.reset_ttl()?),
    );
    let policy = config.revocation.session_policy();

    let auth_service: Arc<dyn AuthServicePort> = match &config.database.url {
        Some(url) => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(url)
                .await?;
            tracing::info!(
                max_connections = config.database.max_connections,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            let store = Arc::new(PostgresCredentialStore::new(pg_pool));
            Arc::new(AuthService::new(store, authenticator, policy))
        }
        None => {
            tracing::warn!("No database configured, users are kept in memory");
            let store = Arc::new(InMemoryCredentialStore::new());
            Arc::new(AuthService::new(store, authenticator, policy))
        }
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    axum::serve(http_listener, create_router(auth_service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server exited");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
