use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::domain::account::models::AuthenticatedSession;
use crate::inbound::http::handlers::session_rejection;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::middleware::extract_token_from_header;
use crate::inbound::http::router::AppState;

pub async fn verify(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<ApiSuccess<VerifyResponseData>, ApiError> {
    let token = extract_token_from_header(&headers)?;

    state
        .auth_service
        .verify_token(token)
        .await
        .map_err(session_rejection)
        .map(|ref session| ApiSuccess::new(StatusCode::OK, session.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyResponseData {
    pub valid: bool,
    pub user_id: String,
    pub email: String,
    pub role: String,
    pub expires_at: DateTime<Utc>,
}

impl From<&AuthenticatedSession> for VerifyResponseData {
    fn from(session: &AuthenticatedSession) -> Self {
        Self {
            valid: true,
            user_id: session.user_id.to_string(),
            email: session.email.clone(),
            role: session.role.as_str().to_string(),
            expires_at: session.expires_at,
        }
    }
}
