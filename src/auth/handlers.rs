use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthPayload, LoginRequest, PublicUser, RegisterRequest},
        error::AuthError,
        jwt::AuthUser,
    },
    response::ApiResponse,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

type ApiResult<T> = Result<ApiResponse<T>, AuthError>;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AuthError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| AuthError::BadRequest(e.body_text()))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<AuthPayload> {
    let input = body(payload)?;
    let data = state.auth.register(input).await?;
    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "User registered successfully.",
        data,
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<AuthPayload> {
    let input = body(payload)?;
    let data = state.auth.login(input).await?;
    Ok(ApiResponse::success(StatusCode::OK, "Login successful.", data))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<PublicUser> {
    let user = state.auth.profile(user_id).await?;
    Ok(ApiResponse::success(StatusCode::OK, "Profile loaded.", user))
}
