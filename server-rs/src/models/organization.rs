use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::UserId;

pub type OrgId = i64;

#[derive(Debug, Clone)]
pub struct Organization {
    pub id: OrgId,
    pub name: String,
    pub owner_id: UserId,
    pub join_secret: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationSettings {
    pub org_id: OrgId,
    pub owner_id: UserId,
    pub max_lobbies: Option<i32>,
    pub max_games_per_season: Option<i32>,
    pub team1_color: Option<String>,
    pub team2_color: Option<String>,
}

impl OrganizationSettings {
    /// The row created alongside a new organization.
    pub fn defaults(org_id: OrgId, owner_id: UserId) -> Self {
        Self {
            org_id,
            owner_id,
            max_lobbies: None,
            max_games_per_season: None,
            team1_color: None,
            team2_color: None,
        }
    }

    pub fn apply(&mut self, patch: &SettingsPatch) {
        for change in patch.iter() {
            match change {
                SettingChange::Owner(id) => self.owner_id = *id,
                SettingChange::MaxLobbies(n) => self.max_lobbies = *n,
                SettingChange::MaxGamesPerSeason(n) => self.max_games_per_season = *n,
                SettingChange::Team1Color(c) => self.team1_color = c.clone(),
                SettingChange::Team2Color(c) => self.team2_color = c.clone(),
            }
        }
    }
}

/// A newly created organization, as reported back to its creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrganization {
    #[serde(rename = "orgid")]
    pub org_id: OrgId,
    #[serde(rename = "orgsecret")]
    pub join_secret: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SettingsField {
    Owner,
    MaxLobbies,
    MaxGamesPerSeason,
    Team1Color,
    Team2Color,
}

impl SettingsField {
    /// Column in `organization_settings`. The only source of column names in
    /// settings updates.
    pub fn column(self) -> &'static str {
        match self {
            SettingsField::Owner => "owner_id",
            SettingsField::MaxLobbies => "max_lobbies",
            SettingsField::MaxGamesPerSeason => "max_games_per_season",
            SettingsField::Team1Color => "team1_color",
            SettingsField::Team2Color => "team2_color",
        }
    }
}

/// New value for one settings column. `None` clears a nullable column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingChange {
    Owner(UserId),
    MaxLobbies(Option<i32>),
    MaxGamesPerSeason(Option<i32>),
    Team1Color(Option<String>),
    Team2Color(Option<String>),
}

impl SettingChange {
    pub fn field(&self) -> SettingsField {
        match self {
            SettingChange::Owner(_) => SettingsField::Owner,
            SettingChange::MaxLobbies(_) => SettingsField::MaxLobbies,
            SettingChange::MaxGamesPerSeason(_) => SettingsField::MaxGamesPerSeason,
            SettingChange::Team1Color(_) => SettingsField::Team1Color,
            SettingChange::Team2Color(_) => SettingsField::Team2Color,
        }
    }
}

/// Partial update of an organization's settings. Only fields present in the
/// map are written; a present `None` clears the column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    fields: BTreeMap<SettingsField, SettingChange>,
}

impl SettingsPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `change`, replacing an earlier change to the same field.
    pub fn with(mut self, change: SettingChange) -> Self {
        self.fields.insert(change.field(), change);
        self
    }

    pub fn owner(self, owner: UserId) -> Self {
        self.with(SettingChange::Owner(owner))
    }

    pub fn max_lobbies(self, n: Option<i32>) -> Self {
        self.with(SettingChange::MaxLobbies(n))
    }

    pub fn max_games_per_season(self, n: Option<i32>) -> Self {
        self.with(SettingChange::MaxGamesPerSeason(n))
    }

    pub fn team1_color(self, color: Option<String>) -> Self {
        self.with(SettingChange::Team1Color(color))
    }

    pub fn team2_color(self, color: Option<String>) -> Self {
        self.with(SettingChange::Team2Color(color))
    }

    /// The new owner, if the patch changes it.
    pub fn new_owner(&self) -> Option<UserId> {
        match self.fields.get(&SettingsField::Owner) {
            Some(SettingChange::Owner(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn contains(&self, field: SettingsField) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SettingChange> {
        self.fields.values()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateOrgRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct JoinOrgRequest {
    #[serde(default)]
    pub orgsecret: String,
}

/// Wire form of a settings edit. The outer `Option` records whether the key
/// was sent at all, the inner one whether it was `null`.
#[derive(Debug, Default, Deserialize)]
pub struct OrgSettingsRequest {
    #[serde(default, deserialize_with = "present")]
    pub orgowner: Option<Option<UserId>>,
    #[serde(default, deserialize_with = "present")]
    pub maxlobbies: Option<Option<i32>>,
    #[serde(default, deserialize_with = "present")]
    pub maxgamesperseason: Option<Option<i32>>,
    #[serde(default, deserialize_with = "present")]
    pub team1color: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub team2color: Option<Option<String>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
