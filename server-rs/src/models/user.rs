use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::OrgId;

pub type UserId = i64;

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub active_org: Option<OrgId>,
    pub created_at: DateTime<Utc>,
}

/// What a login needs to know about a user.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LoginRecord {
    pub username: String,
    pub password_hash: String,
    pub user_id: UserId,
    pub active_org: Option<OrgId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct UserSummary {
    #[serde(rename = "userid")]
    pub user_id: UserId,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}
