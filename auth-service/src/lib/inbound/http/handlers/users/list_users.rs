use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;

use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::handlers::UserData;
use crate::inbound::http::router::AppState;

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 100;

/// Query parameters for listing users
#[derive(Debug, Deserialize)]
pub struct ListUsersParams {
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    offset: Option<u32>,
}

impl ListUsersParams {
    fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
    }

    fn offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<ListUsersParams>,
) -> Result<ApiSuccess<ListUsersResponseData>, ApiError> {
    let limit = params.limit();
    let offset = params.offset();

    let users = state
        .auth_service
        .list_users(limit, offset)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        ListUsersResponseData {
            users: users.iter().map(UserData::from).collect(),
            limit,
            offset,
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListUsersResponseData {
    pub users: Vec<UserData>,
    pub limit: u32,
    pub offset: u32,
}
