use crate::error::{AppError, AppResult};

/// Bounds of the bcrypt work factor. Costs outside them are clamped.
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plain: &str) -> AppResult<String>;

    /// `false` for a wrong password and for a hash that cannot be parsed.
    fn verify(&self, plain: &str, hash: &str) -> bool;
}

#[derive(Debug, Clone)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(MIN_BCRYPT_COST, MAX_BCRYPT_COST),
        }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plain: &str) -> AppResult<String> {
        bcrypt::hash(plain, self.cost).map_err(|e| AppError::Internal(e.to_string()))
    }

    fn verify(&self, plain: &str, hash: &str) -> bool {
        match bcrypt::verify(plain, hash) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!("Unreadable password hash: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let hasher = BcryptHasher::new(MIN_BCRYPT_COST);
        let hash = hasher.hash("pw1").unwrap();

        assert_ne!(hash, "pw1");
        assert!(hasher.verify("pw1", &hash));
        assert!(!hasher.verify("pw2", &hash));
    }

    #[test]
    fn garbage_hash_does_not_verify() {
        let hasher = BcryptHasher::new(MIN_BCRYPT_COST);
        assert!(!hasher.verify("pw1", "not-a-bcrypt-hash"));
    }

    #[test]
    fn out_of_range_costs_are_clamped() {
        assert_eq!(BcryptHasher::new(0).cost, MIN_BCRYPT_COST);
        assert_eq!(BcryptHasher::new(99).cost, MAX_BCRYPT_COST);
        assert_eq!(BcryptHasher::default().cost, bcrypt::DEFAULT_COST);

        let hash = BcryptHasher::new(1).hash("pw1").unwrap();
        assert!(hash.starts_with("$2b$04$"));
    }
}
