//! In-process store for tests and local development.
//!
//! All state sits behind one `RwLock`, and every operation holds the lock for
//! its whole duration, so multi-row writes are atomic the same way a
//! PostgreSQL transaction is.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;

use super::{OrganizationStore, Store, StoreError, StoreResult, UserStore};
use crate::models::{
    LoginRecord, NewOrganization, OrgId, Organization, OrganizationSettings, SettingsPatch, User,
    UserId, UserSummary,
};

const JOIN_SECRET_LEN: usize = 32;

#[derive(Default)]
struct MemoryState {
    users: BTreeMap<UserId, User>,
    organizations: BTreeMap<OrgId, Organization>,
    settings: BTreeMap<OrgId, OrganizationSettings>,
    next_user_id: UserId,
    next_org_id: OrgId,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    fail_settings_insert: AtomicBool,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the settings insert of `create_organization` fail, after the
    /// organization row has been staged.
    pub fn fail_settings_insert(&self, fail: bool) {
        self.fail_settings_insert.store(fail, Ordering::SeqCst);
    }

    /// Make every operation fail as if the database were gone.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn user(&self, id: UserId) -> Option<User> {
        self.read().ok()?.users.get(&id).cloned()
    }

    pub fn organization(&self, id: OrgId) -> Option<Organization> {
        self.read().ok()?.organizations.get(&id).cloned()
    }

    pub fn settings(&self, org_id: OrgId) -> Option<OrganizationSettings> {
        self.read().ok()?.settings.get(&org_id).cloned()
    }

    pub fn organization_count(&self) -> usize {
        self.read().map(|s| s.organizations.len()).unwrap_or(0)
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        Ok(())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, MemoryState>> {
        self.check_available()?;
        self.state
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, MemoryState>> {
        self.check_available()?;
        self.state
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    fn insert_settings(
        &self,
        state: &mut MemoryState,
        org_id: OrgId,
        owner: UserId,
    ) -> StoreResult<()> {
        if self.fail_settings_insert.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "injected failure inserting organization_settings".into(),
            ));
        }
        state
            .settings
            .insert(org_id, OrganizationSettings::defaults(org_id, owner));
        Ok(())
    }
}

fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(JOIN_SECRET_LEN)
        .map(char::from)
        .collect()
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, username: &str, password_hash: &str) -> StoreResult<UserId> {
        let mut state = self.write()?;
        if state.users.values().any(|u| u.username == username) {
            return Err(StoreError::UniqueViolation("users_username_key".into()));
        }

        state.next_user_id += 1;
        let id = state.next_user_id;
        state.users.insert(
            id,
            User {
                id,
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                active_org: None,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn find_login(&self, username: &str) -> StoreResult<Option<LoginRecord>> {
        let state = self.read()?;
        Ok(state
            .users
            .values()
            .find(|u| u.username == username)
            .map(|u| LoginRecord {
                username: u.username.clone(),
                password_hash: u.password_hash.clone(),
                user_id: u.id,
                active_org: u.active_org,
            }))
    }

    async fn list_users(&self) -> StoreResult<Vec<UserSummary>> {
        let state = self.read()?;
        Ok(state
            .users
            .values()
            .map(|u| UserSummary {
                user_id: u.id,
                username: u.username.clone(),
            })
            .collect())
    }

    async fn set_active_org(&self, user_id: UserId, org_id: OrgId) -> StoreResult<bool> {
        let mut state = self.write()?;
        if !state.organizations.contains_key(&org_id) {
            return Err(StoreError::ConstraintViolation(format!(
                "users_active_org_fkey: organization {org_id} does not exist"
            )));
        }
        match state.users.get_mut(&user_id) {
            Some(user) => {
                user.active_org = Some(org_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl OrganizationStore for MemoryStore {
    async fn create_organization(
        &self,
        owner: UserId,
        name: &str,
    ) -> StoreResult<NewOrganization> {
        let mut state = self.write()?;

        let mut join_secret = generate_secret();
        while state
            .organizations
            .values()
            .any(|o| o.join_secret == join_secret)
        {
            join_secret = generate_secret();
        }

        if !state.users.contains_key(&owner) {
            return Err(StoreError::ConstraintViolation(format!(
                "organizations_owner_id_fkey: user {owner} does not exist"
            )));
        }

        // Ids are not reused after a rollback, same as a sequence.
        state.next_org_id += 1;
        let org_id = state.next_org_id;
        state.organizations.insert(
            org_id,
            Organization {
                id: org_id,
                name: name.to_string(),
                owner_id: owner,
                join_secret: join_secret.clone(),
                created_at: Utc::now(),
            },
        );

        if let Err(e) = self.insert_settings(&mut state, org_id, owner) {
            state.organizations.remove(&org_id);
            return Err(e);
        }

        Ok(NewOrganization {
            org_id,
            join_secret,
        })
    }

    async fn find_org_by_secret(&self, secret: &str) -> StoreResult<Option<OrgId>> {
        let state = self.read()?;
        Ok(state
            .organizations
            .values()
            .find(|o| o.join_secret == secret)
            .map(|o| o.id))
    }

    async fn update_settings(&self, org_id: OrgId, patch: &SettingsPatch) -> StoreResult<u64> {
        let mut state = self.write()?;
        if let Some(owner) = patch.new_owner() {
            if !state.users.contains_key(&owner) {
                return Err(StoreError::ConstraintViolation(format!(
                    "organization_settings_owner_id_fkey: user {owner} does not exist"
                )));
            }
        }
        match state.settings.get_mut(&org_id) {
            Some(settings) if !patch.is_empty() => {
                settings.apply(patch);
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> bool {
        self.check_available().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_username_is_a_unique_violation() {
        let store = MemoryStore::new();
        assert_eq!(store.insert_user("alice", "h1").await.unwrap(), 1);

        let err = store.insert_user("alice", "h2").await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn organization_and_settings_are_created_together() {
        let store = MemoryStore::new();
        let owner = store.insert_user("alice", "h").await.unwrap();

        let created = store.create_organization(owner, "Acme").await.unwrap();
        assert_eq!(created.join_secret.len(), JOIN_SECRET_LEN);
        assert_eq!(
            store.settings(created.org_id),
            Some(OrganizationSettings::defaults(created.org_id, owner))
        );

        store.fail_settings_insert(true);
        assert!(matches!(
            store.create_organization(owner, "Broken").await,
            Err(StoreError::Unavailable(_))
        ));
        assert_eq!(store.organization_count(), 1);
        assert_eq!(store.organization(created.org_id + 1).map(|o| o.id), None);
        assert_eq!(store.settings(created.org_id + 1), None);

        store.fail_settings_insert(false);
        let next = store.create_organization(owner, "Fixed").await.unwrap();
        assert_eq!(store.organization_count(), 2);
        assert!(store.settings(next.org_id).is_some());
        assert_eq!(store.find_org_by_secret(&next.join_secret).await.unwrap(), Some(next.org_id));
    }

    #[tokio::test]
    async fn settings_owner_must_be_an_existing_user() {
        let store = MemoryStore::new();
        let owner = store.insert_user("alice", "h").await.unwrap();
        let created = store.create_organization(owner, "Acme").await.unwrap();

        let err = store
            .update_settings(created.org_id, &SettingsPatch::new().owner(999).max_lobbies(Some(2)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)));
        assert_eq!(
            store.settings(created.org_id),
            Some(OrganizationSettings::defaults(created.org_id, owner))
        );

        let bob = store.insert_user("bob", "h").await.unwrap();
        let touched = store
            .update_settings(created.org_id, &SettingsPatch::new().owner(bob))
            .await
            .unwrap();
        assert_eq!(touched, 1);
        assert_eq!(store.settings(created.org_id).unwrap().owner_id, bob);
    }

    #[tokio::test]
    async fn organization_owner_must_be_an_existing_user() {
        let store = MemoryStore::new();

        assert!(matches!(
            store.create_organization(7, "Acme").await,
            Err(StoreError::ConstraintViolation(_))
        ));
        assert_eq!(store.organization_count(), 0);
    }

    #[tokio::test]
    async fn active_org_must_reference_an_organization() {
        let store = MemoryStore::new();
        let user = store.insert_user("bob", "h").await.unwrap();

        assert!(matches!(
            store.set_active_org(user, 42).await,
            Err(StoreError::ConstraintViolation(_))
        ));
        assert_eq!(store.user(user).unwrap().active_org, None);
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_unavailable(true);

        assert!(!store.ping().await);
        assert!(matches!(
            store.find_login("alice").await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
