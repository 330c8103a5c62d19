use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiJson;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::handlers::TokenData;
use crate::inbound::http::router::AppState;

/// Issue a password reset token. The token is returned in the response body;
/// delivering it out of band is left to the caller.
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ForgotPasswordRequest>,
) -> Result<ApiSuccess<TokenData>, ApiError> {
    let issued = state
        .auth_service
        .request_password_reset(&body.email)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        TokenData {
            token: issued.token,
            expires_at: issued.expires_at,
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForgotPasswordRequest {
    email: String,
}
