use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::{auth::repo::StoreError, response::ApiResponse};

/// Business errors for the auth workflows.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Carries the human message for the endpoint that rejected the input.
    #[error("missing fields")]
    MissingFields {
        message: &'static str,
        detail: &'static str,
    },
    #[error("invalid email")]
    InvalidEmail,
    #[error("weak password")]
    WeakPassword,
    #[error("malformed request body: {0}")]
    BadRequest(String),
    #[error("user exists")]
    Conflict,
    #[error("user not found")]
    NotFound,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error(transparent)]
    Store(StoreError),
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("token signing failed: {0}")]
    Token(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation(_) => AuthError::Conflict,
            other => AuthError::Store(other),
        }
    }
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingFields { .. }
            | AuthError::InvalidEmail
            | AuthError::WeakPassword
            | AuthError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::Conflict => StatusCode::CONFLICT,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::InvalidCredentials | AuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AuthError::Store(_) | AuthError::Hash(_) | AuthError::Token(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> &'static str {
        match self {
            AuthError::MissingFields { message, .. } => *message,
            AuthError::InvalidEmail => "Invalid email format.",
            AuthError::WeakPassword => "Password too weak.",
            AuthError::BadRequest(_) => "Invalid request body.",
            AuthError::Conflict => "User already exists.",
            AuthError::NotFound => "User not found. Please register.",
            AuthError::InvalidCredentials => "Invalid credentials.",
            AuthError::Unauthorized(_) => "Unauthorized.",
            AuthError::Store(_) | AuthError::Hash(_) | AuthError::Token(_) => {
                "Internal server error."
            }
        }
    }

    fn detail(&self) -> String {
        match self {
            AuthError::MissingFields { detail, .. } => (*detail).to_string(),
            AuthError::InvalidEmail => "Please provide a valid email address".into(),
            AuthError::WeakPassword => "Password must be at least 6 characters long".into(),
            AuthError::Conflict => "Email or username is already registered".into(),
            AuthError::NotFound => "User does not exist".into(),
            AuthError::InvalidCredentials => "Password is incorrect".into(),
            AuthError::BadRequest(reason) | AuthError::Unauthorized(reason) => reason.clone(),
            AuthError::Store(e) => e.to_string(),
            AuthError::Hash(e) | AuthError::Token(e) => e.clone(),
        }
    }

    pub fn to_envelope(&self) -> ApiResponse<()> {
        ApiResponse::failure(self.status(), self.message(), self.detail())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, %status, "request failed");
        } else {
            warn!(error = %self, %status, "request rejected");
        }
        self.to_envelope().into_response()
    }
}
