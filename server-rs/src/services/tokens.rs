//! Session credentials: HS256 JWTs with a fixed 24 hour lifetime.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::UserId;

pub const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub userid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activeorg: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn user_id(&self) -> AppResult<UserId> {
        self.userid
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid token subject".into()))
    }

    /// The bound organization, if any. An empty claim counts as none.
    pub fn active_org(&self) -> Option<&str> {
        self.activeorg.as_deref().filter(|org| !org.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
}

#[derive(Clone)]
pub struct ClaimsIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl ClaimsIssuer {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // An expired credential is treated as absent, no grace period.
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, identity: &Identity, active_org: Option<&str>) -> AppResult<String> {
        self.sign(
            identity.username.clone(),
            identity.user_id.to_string(),
            active_org,
        )
    }

    /// Re-issue a credential for already validated claims, with a new expiry.
    pub fn refresh(&self, current: &Claims) -> AppResult<String> {
        self.sign(
            current.username.clone(),
            current.userid.clone(),
            current.active_org(),
        )
    }

    /// Verify signature and expiry, then return the claims.
    pub fn decode(&self, token: &str) -> AppResult<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }

    fn sign(&self, username: String, userid: String, active_org: Option<&str>) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            username,
            userid,
            activeorg: active_org
                .filter(|org| !org.is_empty())
                .map(String::from),
            exp: now + SESSION_TTL_SECS,
            iat: now,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }
}
