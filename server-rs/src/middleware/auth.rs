use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::error::AppError;
use crate::models::UserId;
use crate::services::tokens::Claims;
use crate::AppState;

/// The authenticated caller, built from verified claims.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
    pub username: String,
    pub claims: Claims,
}

impl AuthUser {
    pub fn from_claims(claims: Claims) -> Result<Self, AppError> {
        Ok(Self {
            id: claims.user_id()?,
            username: claims.username.clone(),
            claims,
        })
    }
}

/// Middleware: requires a valid, unexpired bearer token. Sets AuthUser in
/// extensions.
pub async fn authenticate(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) =
        bearer.ok_or_else(|| AppError::Unauthorized("No token provided".into()))?;

    let claims = state.issuer.decode(bearer.token())?;
    let user = AuthUser::from_claims(claims)?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
