use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{
    normalize_email, LoginRequest, MessageResponse, PublicUser, RegisterRequest,
    UpdateProfileRequest,
};
use crate::{
    auth::{
        cookie::{cleared_session_cookie, session_cookie},
        extractors::CurrentUser,
    },
    error::{not_found, AppError},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register).fallback(not_found))
        .route("/users/auth", post(login).fallback(not_found))
        .route("/users/logout", post(logout).fallback(not_found))
        .route(
            "/users/profile",
            get(get_profile).put(update_profile).fallback(not_found),
        )
}

/// Signs a token for `user_id` and puts it in the session cookie.
fn issue_session(state: &AppState, jar: CookieJar, user_id: Uuid) -> Result<CookieJar, AppError> {
    let token = state.keys.sign(user_id)?;
    Ok(jar.add(session_cookie(
        token,
        state.keys.ttl(),
        state.config.secure_cookies(),
    )))
}

#[instrument(skip(state, jar, payload))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, CookieJar, Json<PublicUser>), AppError> {
    let Json(payload) = payload?;
    let new_user = payload.validate()?;
    let user = state.users.create(new_user).await?;
    let jar = issue_session(&state, jar, user.id)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, jar, Json(user.into())))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(StatusCode, CookieJar, Json<PublicUser>), AppError> {
    let Json(payload) = payload?;
    let email = normalize_email(&payload.email);
    let user = state.users.authenticate(&email, &payload.password).await?;
    let jar = issue_session(&state, jar, user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((StatusCode::CREATED, jar, Json(user.into())))
}

/// Clears the session cookie. Tokens already handed out stay valid until
/// they expire.
#[instrument(skip(jar))]
pub async fn logout(jar: CookieJar) -> (StatusCode, CookieJar, Json<MessageResponse>) {
    info!("user logged out");
    (
        StatusCode::OK,
        jar.add(cleared_session_cookie()),
        Json(MessageResponse {
            message: "User logged out".into(),
        }),
    )
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn get_profile(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(user)
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<PublicUser>, AppError> {
    let Json(payload) = payload?;
    let changes = payload.validate()?;
    let updated = state.users.update(user.id, changes).await?;
    Ok(Json(updated.into()))
}
