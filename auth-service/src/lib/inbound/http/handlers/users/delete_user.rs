use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;

use crate::domain::account::models::UserId;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::handlers::MessageData;
use crate::inbound::http::router::AppState;

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    let user_id = UserId::from_string(&user_id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid user ID: {}", e)))?;

    state
        .auth_service
        .delete_user(&user_id)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new("User deleted"),
    ))
}
