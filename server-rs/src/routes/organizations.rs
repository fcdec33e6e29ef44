use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::models::organization::*;
use crate::services::tokens::Identity;
use crate::AppState;

pub async fn create_org(
    State(state): State<AppState>,
    user: axum::Extension<AuthUser>,
    Json(body): Json<CreateOrgRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let created = state.orgs.create(user.id, &body.name).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Org created successfully",
            "orgid": created.org_id,
            "orgsecret": created.join_secret,
        })),
    ))
}

/// Joins the organization and hands back a credential that already carries
/// the new `activeorg`.
pub async fn join_org(
    State(state): State<AppState>,
    user: axum::Extension<AuthUser>,
    Json(body): Json<JoinOrgRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let org_id = state.orgs.join(user.id, &body.orgsecret).await?;

    let identity = Identity {
        user_id: user.id,
        username: user.username.clone(),
    };
    let token = state.issuer.issue(&identity, Some(org_id.to_string().as_str()))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Added user to organization",
            "orgid": org_id,
            "token": token,
        })),
    ))
}

pub async fn edit_settings(
    State(state): State<AppState>,
    user: axum::Extension<AuthUser>,
    Json(body): Json<OrgSettingsRequest>,
) -> AppResult<Json<Value>> {
    let patch = SettingsPatch::try_from(body)?;
    state.settings.update(&user.claims, &patch).await?;

    Ok(Json(json!({
        "message": "Organization settings updated successfully",
    })))
}
