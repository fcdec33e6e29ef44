use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::models::user::UserSummary;
use crate::AppState;

pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserSummary>>> {
    Ok(Json(state.users.list().await?))
}
