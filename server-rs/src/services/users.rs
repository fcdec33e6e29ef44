use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::{LoginRecord, UserId, UserSummary};
use crate::services::credentials::PasswordHasher;
use crate::services::tokens::{ClaimsIssuer, Identity};
use crate::store::{StoreError, UserStore};

const BAD_CREDENTIALS: &str = "User or password are wrong";

#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    issuer: ClaimsIssuer,
}

impl UserDirectory {
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        issuer: ClaimsIssuer,
    ) -> Self {
        Self {
            store,
            hasher,
            issuer,
        }
    }

    pub async fn register(&self, username: &str, password: &str) -> AppResult<UserId> {
        require_credentials(username, password)?;

        let password_hash = self.hasher.hash(password)?;

        match self.store.insert_user(username, &password_hash).await {
            Ok(user_id) => {
                tracing::info!(user_id, "User registered");
                Ok(user_id)
            }
            Err(StoreError::UniqueViolation(_)) => {
                Err(AppError::Conflict("Username already exists".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Look up what a login needs. A missing user is `NotFound`, kept apart
    /// from store failures so callers can answer uniformly.
    pub async fn resolve_for_login(&self, username: &str) -> AppResult<LoginRecord> {
        self.store
            .find_login(username)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    pub async fn login(&self, username: &str, password: &str) -> AppResult<String> {
        require_credentials(username, password)?;

        let record = match self.resolve_for_login(username).await {
            Ok(record) => record,
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()))
            }
            Err(e) => return Err(e),
        };

        if !self.hasher.verify(password, &record.password_hash) {
            return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
        }

        let identity = Identity {
            user_id: record.user_id,
            username: record.username,
        };
        let active_org = record.active_org.map(|id| id.to_string());
        self.issuer.issue(&identity, active_org.as_deref())
    }

    pub async fn list(&self) -> AppResult<Vec<UserSummary>> {
        Ok(self.store.list_users().await?)
    }
}

fn require_credentials(username: &str, password: &str) -> AppResult<()> {
    if username.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::credentials::{BcryptHasher, MIN_BCRYPT_COST};
    use crate::services::tokens::SESSION_TTL_SECS;
    use crate::store::{MemoryStore, OrganizationStore};

    fn directory(store: Arc<MemoryStore>) -> (UserDirectory, ClaimsIssuer) {
        let issuer = ClaimsIssuer::new("test-secret");
        let hasher = Arc::new(BcryptHasher::new(MIN_BCRYPT_COST));
        (UserDirectory::new(store, hasher, issuer.clone()), issuer)
    }

    #[tokio::test]
    async fn registered_password_verifies_against_stored_hash() {
        let store = Arc::new(MemoryStore::new());
        let (users, _) = directory(store);
        let hasher = BcryptHasher::new(MIN_BCRYPT_COST);

        for (name, pw) in [("alice", "pw1"), ("bob", "correct horse"), ("ünï", "密码")] {
            let id = users.register(name, pw).await.unwrap();
            let record = users.resolve_for_login(name).await.unwrap();
            assert_eq!(record.user_id, id);
            assert!(hasher.verify(pw, &record.password_hash));
        }
    }

    #[tokio::test]
    async fn empty_fields_are_rejected() {
        let (users, _) = directory(Arc::new(MemoryStore::new()));

        assert!(matches!(users.register("", "pw").await, Err(AppError::BadRequest(_))));
        assert!(matches!(users.register("alice", "").await, Err(AppError::BadRequest(_))));
        assert!(matches!(users.login("", "pw").await, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn concurrent_duplicate_registration_has_one_winner() {
        let (users, _) = directory(Arc::new(MemoryStore::new()));

        let (a, b) = tokio::join!(
            users.register("alice", "pw1"),
            users.register("alice", "pw2")
        );
        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            outcomes
                .iter()
                .filter(|r| matches!(r, Err(AppError::Conflict(_))))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn login_issues_claims_for_the_registered_user() {
        let store = Arc::new(MemoryStore::new());
        let (users, issuer) = directory(store.clone());
        let id = users.register("alice", "pw1").await.unwrap();

        let claims = issuer.decode(&users.login("alice", "pw1").await.unwrap()).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.userid, id.to_string());
        assert_eq!(claims.exp - claims.iat, SESSION_TTL_SECS);
        assert_eq!(claims.activeorg, None);

        let org = store.create_organization(id, "Acme").await.unwrap();
        store.set_active_org(id, org.org_id).await.unwrap();
        let claims = issuer.decode(&users.login("alice", "pw1").await.unwrap()).unwrap();
        assert_eq!(claims.activeorg, Some(org.org_id.to_string()));
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_look_the_same() {
        let (users, _) = directory(Arc::new(MemoryStore::new()));
        users.register("alice", "pw1").await.unwrap();

        let wrong_password = users.login("alice", "nope").await.unwrap_err();
        let unknown_user = users.login("mallory", "pw1").await.unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert!(matches!(wrong_password, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn store_failure_is_internal_not_bad_credentials() {
        let store = Arc::new(MemoryStore::new());
        let (users, _) = directory(store.clone());
        store.set_unavailable(true);

        assert!(matches!(users.login("alice", "pw1").await, Err(AppError::Store(_))));
        assert!(matches!(users.register("alice", "pw1").await, Err(AppError::Store(_))));
    }
}
