use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, info, instrument, warn};

use super::{
    dto::{AuthResponse, LoginRequest, SignupRequest},
    extractors::CurrentUser,
    jwt::JwtKeys,
    services, session,
};
use crate::{
    dto::MessageResponse,
    error::{AppError, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/authCheck", get(auth_check))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload.map(|Json(v)| v).map_err(|e| {
        warn!(status = %e.status(), error = %e.body_text(), "rejected request body");
        AppError::Validation("Invalid request body".into())
    })
}

#[instrument(skip(state, jar, payload))]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> AppResult<(StatusCode, CookieJar, Json<AuthResponse>)> {
    let req = body(payload)?;
    let user = services::signup(state.users.as_ref(), state.random.as_ref(), req).await?;

    // The account is persisted before any session exists for it.
    let keys = JwtKeys::from_ref(&state);
    let jar = session::issue(jar, &keys, &state.config.cookie, user.id)?;

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            success: true,
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let req = body(payload)?;
    let user = services::login(state.users.as_ref(), req).await?;

    let keys = JwtKeys::from_ref(&state);
    let jar = session::issue(jar, &keys, &state.config.cookie, user.id)?;

    Ok((
        jar,
        Json(AuthResponse {
            success: true,
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let jar = session::clear(jar, &state.config.cookie);
    info!("session cleared");
    (jar, Json(MessageResponse::ok("Logged out successfully")))
}

#[instrument(skip_all)]
pub async fn auth_check(CurrentUser(user): CurrentUser) -> Json<AuthResponse> {
    debug!(user_id = %user.id, "session check");
    Json(AuthResponse {
        success: true,
        user: user.into(),
    })
}
