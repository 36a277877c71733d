use axum::{async_trait, extract::FromRef, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use super::{jwt::JwtKeys, session};
use crate::{error::AppError, state::AppState, users::User};

/// The authenticated caller, loaded fresh from the store on every request.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session::token_from_headers(&parts.headers, &state.config.cookie.name)
            .ok_or_else(|| AppError::Unauthorized("Unauthorized - No Token Provided".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = match keys.verify(&token) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "invalid or expired token");
                return Err(AppError::Unauthorized("Unauthorized - Invalid Token".into()));
            }
        };

        let user = state
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "token for unknown user");
                AppError::NotFound("User not found".into())
            })?;

        Ok(CurrentUser(user))
    }
}
