use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::{NewOrganization, OrgId, UserId};
use crate::store::{OrganizationStore, UserStore};

#[derive(Clone)]
pub struct OrganizationRegistry {
    orgs: Arc<dyn OrganizationStore>,
    users: Arc<dyn UserStore>,
}

impl OrganizationRegistry {
    pub fn new(orgs: Arc<dyn OrganizationStore>, users: Arc<dyn UserStore>) -> Self {
        Self { orgs, users }
    }

    /// Create an organization owned by `caller` together with its default
    /// settings. Either both rows exist afterwards or neither does.
    pub async fn create(&self, caller: UserId, name: &str) -> AppResult<NewOrganization> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Organization name is required".into()));
        }

        let created = self
            .orgs
            .create_organization(caller, name)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create organization: {e}")))?;

        tracing::info!(org_id = created.org_id, owner = caller, "Organization created");
        Ok(created)
    }

    pub async fn resolve_by_secret(&self, secret: &str) -> AppResult<OrgId> {
        self.orgs
            .find_org_by_secret(secret)
            .await?
            .ok_or_else(|| AppError::NotFound("No organization with that secret".into()))
    }

    /// Make the organization behind `secret` the caller's active one.
    /// Joining the same organization again is a no-op.
    pub async fn join(&self, caller: UserId, secret: &str) -> AppResult<OrgId> {
        if secret.is_empty() {
            return Err(AppError::BadRequest("Org secret is required".into()));
        }

        let org_id = self.resolve_by_secret(secret).await?;

        if !self.users.set_active_org(caller, org_id).await? {
            return Err(AppError::NotFound("User not found".into()));
        }

        tracing::info!(user_id = caller, org_id, "User joined organization");
        Ok(org_id)
    }
}
