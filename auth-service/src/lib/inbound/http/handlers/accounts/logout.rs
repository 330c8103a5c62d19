use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;

use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::handlers::MessageData;
use crate::inbound::http::middleware::extract_token_from_header;
use crate::inbound::http::router::AppState;

/// Revoke the session token in the Authorization header.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    let token = extract_token_from_header(&headers)?;

    state
        .auth_service
        .logout(token)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new("Logged out successfully"),
    ))
}
