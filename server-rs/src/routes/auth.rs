use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::models::user::*;
use crate::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let user_id = state.users.register(&body.username, &body.password).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "userid": user_id,
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> AppResult<Json<TokenResponse>> {
    let token = state.users.login(&body.username, &body.password).await?;
    Ok(Json(TokenResponse { token }))
}

pub async fn refresh(
    State(state): State<AppState>,
    user: axum::Extension<AuthUser>,
) -> AppResult<Json<TokenResponse>> {
    let token = state.issuer.refresh(&user.claims)?;
    Ok(Json(TokenResponse { token }))
}
