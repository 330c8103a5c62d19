use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use crate::domain::account::errors::AuthError;
use crate::domain::account::models::Password;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiJson;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::handlers::MessageData;
use crate::inbound::http::router::AppState;

pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ResetPasswordRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    let new_password =
        Password::new(body.new_password).map_err(|e| ApiError::from(AuthError::from(e)))?;

    state
        .auth_service
        .reset_password(&body.token, new_password)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new("Password has been reset"),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResetPasswordRequest {
    token: String,
    new_password: String,
}
