use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{OrganizationStore, Store, StoreError, StoreResult, UserStore};
use crate::models::{
    LoginRecord, NewOrganization, OrgId, SettingChange, SettingsPatch, UserId, UserSummary,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            return StoreError::UniqueViolation(constraint);
        }
        if db_err.is_foreign_key_violation() {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            return StoreError::ConstraintViolation(constraint);
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, username: &str, password_hash: &str) -> StoreResult<UserId> {
        sqlx::query_scalar("INSERT INTO users (username, password_hash) VALUES ($1, $2) RETURNING id")
            .bind(username)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)
    }

    async fn find_login(&self, username: &str) -> StoreResult<Option<LoginRecord>> {
        let record = sqlx::query_as::<_, LoginRecord>(
            "SELECT username, password_hash, id AS user_id, active_org FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn list_users(&self) -> StoreResult<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(
            "SELECT id AS user_id, username FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn set_active_org(&self, user_id: UserId, org_id: OrgId) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE users SET active_org = $1 WHERE id = $2")
            .bind(org_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OrganizationStore for PgStore {
    async fn create_organization(
        &self,
        owner: UserId,
        name: &str,
    ) -> StoreResult<NewOrganization> {
        let mut tx = self.pool.begin().await?;

        let (org_id, join_secret): (OrgId, String) = sqlx::query_as(
            "INSERT INTO organizations (name, owner_id) VALUES ($1, $2) RETURNING id, join_secret",
        )
        .bind(name)
        .bind(owner)
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;

        sqlx::query("INSERT INTO organization_settings (org_id, owner_id) VALUES ($1, $2)")
            .bind(org_id)
            .bind(owner)
            .execute(&mut *tx)
            .await
            .map_err(classify)?;

        tx.commit().await?;

        Ok(NewOrganization {
            org_id,
            join_secret,
        })
    }

    async fn find_org_by_secret(&self, secret: &str) -> StoreResult<Option<OrgId>> {
        let org_id = sqlx::query_scalar("SELECT id FROM organizations WHERE join_secret = $1")
            .bind(secret)
            .fetch_optional(&self.pool)
            .await?;
        Ok(org_id)
    }

    async fn update_settings(&self, org_id: OrgId, patch: &SettingsPatch) -> StoreResult<u64> {
        if patch.is_empty() {
            return Ok(0);
        }

        let mut query = QueryBuilder::<Postgres>::new("UPDATE organization_settings SET ");
        let mut assignments = query.separated(", ");
        for change in patch.iter() {
            assignments.push(change.field().column());
            assignments.push_unseparated(" = ");
            match change {
                SettingChange::Owner(id) => assignments.push_bind_unseparated(*id),
                SettingChange::MaxLobbies(n) | SettingChange::MaxGamesPerSeason(n) => {
                    assignments.push_bind_unseparated(*n)
                }
                SettingChange::Team1Color(c) | SettingChange::Team2Color(c) => {
                    assignments.push_bind_unseparated(c.clone())
                }
            };
        }
        query.push(" WHERE org_id = ").push_bind(org_id);

        let result = query.build().execute(&self.pool).await.map_err(classify)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}
