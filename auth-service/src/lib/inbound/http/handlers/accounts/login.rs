use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiJson;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::handlers::TokenData;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<ApiSuccess<TokenData>, ApiError> {
    let issued = state
        .auth_service
        .login(&body.email, &body.password)
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

/// HTTP request body for login (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}
