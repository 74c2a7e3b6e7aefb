//! `POST /api/auth/register` and `POST /api/auth/login`.
//!
//! Failures answer `{"message": ...}`: 400 for caller mistakes, 500 when the
//! store or hashing fails.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use scoreline_auth::{AccountError, AuthResponse, LoginRequest, RegisterRequest};
use serde_json::json;
use tracing::{debug, error};

use crate::server::AppState;

/// `{"message": <message>}` with `status`.
pub fn message_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn account_error(err: &AccountError) -> Response {
    match err {
        AccountError::UserExists => message_response(StatusCode::BAD_REQUEST, "User already exists"),
        AccountError::InvalidCredentials => {
            message_response(StatusCode::BAD_REQUEST, "Invalid credentials")
        }
        AccountError::MissingCredentials => {
            message_response(StatusCode::BAD_REQUEST, "Email and password are required")
        }
        AccountError::Store(_) | AccountError::Auth(_) => {
            error!(error = %err, "account request failed");
            server_error()
        }
    }
}

fn server_error() -> Response {
    message_response(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
}

async fn run_blocking<F>(op: F) -> Result<AuthResponse, Response>
where
    F: FnOnce() -> Result<AuthResponse, AccountError> + Send + 'static,
{
    match tokio::task::spawn_blocking(op).await {
        Ok(Ok(resp)) => Ok(resp),
        Ok(Err(e)) => Err(account_error(&e)),
        Err(e) => {
            error!(error = %e, "account task failed");
            Err(server_error())
        }
    }
}

/// POST /api/auth/register
pub async fn register_handler(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            debug!(error = %rejection, "rejected register body");
            return message_response(StatusCode::BAD_REQUEST, "Invalid request body");
        }
    };
    let accounts = state.accounts.clone();
    match run_blocking(move || accounts.register(req)).await {
        Ok(resp) => (StatusCode::CREATED, Json(resp)).into_response(),
        Err(resp) => resp,
    }
}

/// POST /api/auth/login
pub async fn login_handler(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            debug!(error = %rejection, "rejected login body");
            return message_response(StatusCode::BAD_REQUEST, "Invalid request body");
        }
    };
    let accounts = state.accounts.clone();
    match run_blocking(move || accounts.login(req)).await {
        Ok(resp) => Json(resp).into_response(),
        Err(resp) => resp,
    }
}
