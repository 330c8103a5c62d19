use axum::extract::Request;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::domain::account::models::Role;
use crate::domain::account::models::UserId;
use crate::inbound::http::handlers::session_rejection;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// Extension type carrying the verified caller of a protected route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
}

/// Middleware that verifies the session token and adds the caller to request extensions
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token_from_header(req.headers())?;

    let session = state
        .auth_service
        .verify_token(token)
        .await
        .map_err(|e| {
            tracing::warn!("Session verification failed: {}", e);
            session_rejection(e)
        })?;

    req.extensions_mut().insert(AuthenticatedUser {
        user_id: session.user_id,
        email: session.email,
        role: session.role,
    });

    Ok(next.run(req).await)
}

/// Middleware for admin-only routes; must run after `authenticate`
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
    let user = req
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

    if user.role != Role::Admin {
        tracing::warn!(user_id = %user.user_id, "Admin route refused");
        return Err(ApiError::Forbidden("Admin role required".to_string()));
    }

    Ok(next.run(req).await)
}

/// Raw value of the Authorization header. A leading `Bearer ` is removed by
/// the service, so both forms are passed through.
pub fn extract_token_from_header(headers: &HeaderMap) -> Result<&str, ApiError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header".to_string()))?;

    if auth_str.trim().is_empty() {
        return Err(ApiError::Unauthorized(
            "Missing Authorization header".to_string(),
        ));
    }

    Ok(auth_str)
}
