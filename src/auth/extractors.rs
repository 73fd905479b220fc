use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use time::OffsetDateTime;
use tracing::warn;

use super::{cookie::session_token, jwt::JwtKeys};
use crate::{
    error::AppError,
    state::AppState,
    users::{dto::PublicUser, services::UserService},
};

/// Authenticated caller, resolved from the session cookie. The stored
/// password hash never leaves the gate.
pub struct CurrentUser(pub PublicUser);

/// Verifies `token` at `now` and loads the user it names.
pub async fn resolve_session(
    keys: &JwtKeys,
    users: &UserService,
    token: &str,
    now: OffsetDateTime,
) -> Result<PublicUser, AppError> {
    let claims = keys.verify(token, now)?;
    let user_id = claims.user_id()?;
    let user = users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {} not found", user_id)))?;
    Ok(user.into())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token =
            session_token(&jar).ok_or(AppError::Unauthorized("Not authorized, no token"))?;

        match resolve_session(&state.keys, &state.users, &token, OffsetDateTime::now_utc()).await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(e) => {
                warn!(error = %e, "session rejected");
                Err(AppError::Unauthorized("Not authorized, invalid token"))
            }
        }
    }
}
