//! Storage seam.
//!
//! The services only see [`UserStore`] and [`OrganizationStore`]. Cross-row
//! invariants (unique usernames, an organization together with its settings
//! row) are the store's job, through constraints and transactions.

use async_trait::async_trait;

use crate::models::{LoginRecord, NewOrganization, OrgId, SettingsPatch, UserId, UserSummary};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("constraint violated: {0}")]
    ConstraintViolation(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user and return its id. A taken username is reported as
    /// [`StoreError::UniqueViolation`].
    async fn insert_user(&self, username: &str, password_hash: &str) -> StoreResult<UserId>;

    async fn find_login(&self, username: &str) -> StoreResult<Option<LoginRecord>>;

    async fn list_users(&self) -> StoreResult<Vec<UserSummary>>;

    /// Bind the user's active organization. Returns `false` if the user does
    /// not exist.
    async fn set_active_org(&self, user_id: UserId, org_id: OrgId) -> StoreResult<bool>;
}

#[async_trait]
pub trait OrganizationStore: Send + Sync {
    /// Insert an organization owned by `owner` and its default settings row
    /// in one transaction. The join secret is generated by the store.
    async fn create_organization(&self, owner: UserId, name: &str)
        -> StoreResult<NewOrganization>;

    async fn find_org_by_secret(&self, secret: &str) -> StoreResult<Option<OrgId>>;

    /// Apply `patch` to the settings row of `org_id`. Returns the number of
    /// rows touched.
    async fn update_settings(&self, org_id: OrgId, patch: &SettingsPatch) -> StoreResult<u64>;
}

/// A complete backend.
#[async_trait]
pub trait Store: UserStore + OrganizationStore {
    async fn ping(&self) -> bool;
}
