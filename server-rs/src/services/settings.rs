use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::{OrgId, OrgSettingsRequest, SettingsPatch};
use crate::services::tokens::Claims;
use crate::store::{OrganizationStore, StoreError};

impl TryFrom<OrgSettingsRequest> for SettingsPatch {
    type Error = AppError;

    fn try_from(req: OrgSettingsRequest) -> AppResult<Self> {
        let mut patch = SettingsPatch::new();
        match req.orgowner {
            Some(Some(owner)) => patch = patch.owner(owner),
            Some(None) => return Err(AppError::BadRequest("orgowner cannot be null".into())),
            None => {}
        }
        if let Some(n) = req.maxlobbies {
            patch = patch.max_lobbies(n);
        }
        if let Some(n) = req.maxgamesperseason {
            patch = patch.max_games_per_season(n);
        }
        if let Some(color) = req.team1color {
            patch = patch.team1_color(color);
        }
        if let Some(color) = req.team2color {
            patch = patch.team2_color(color);
        }
        Ok(patch)
    }
}

#[derive(Clone)]
pub struct SettingsEditor {
    orgs: Arc<dyn OrganizationStore>,
}

impl SettingsEditor {
    pub fn new(orgs: Arc<dyn OrganizationStore>) -> Self {
        Self { orgs }
    }

    /// Apply `patch` to the settings of the caller's active organization.
    pub async fn update(&self, caller: &Claims, patch: &SettingsPatch) -> AppResult<()> {
        if patch.is_empty() {
            return Err(AppError::BadRequest(
                "At least one option must be passed in".into(),
            ));
        }

        let org_id: OrgId = caller
            .active_org()
            .ok_or_else(|| AppError::Unauthorized("User not part of any org".into()))?
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid activeorg format".into()))?;

        let touched = self
            .orgs
            .update_settings(org_id, patch)
            .await
            .map_err(|e| match e {
                StoreError::ConstraintViolation(_) => {
                    AppError::BadRequest("orgowner must be an existing user".into())
                }
                other => other.into(),
            })?;
        if touched == 0 {
            return Err(AppError::Internal(format!(
                "No settings row for organization {org_id}"
            )));
        }

        tracing::info!(org_id, fields = patch.len(), "Organization settings updated");
        Ok(())
    }
}
