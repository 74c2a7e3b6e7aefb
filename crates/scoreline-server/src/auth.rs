//! Bearer-token guard for the HTTP API.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use scoreline_auth::{TokenIssuer, bearer_token};
use tracing::debug;

use crate::accounts::message_response;

/// The user a request was authenticated as; inserted into request extensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// `userId` claim of the verified token.
    pub user_id: String,
}

/// Reject requests without a valid bearer token.
pub async fn require_auth(
    State(issuer): State<Arc<TokenIssuer>>,
    mut req: Request,
    next: Next,
) -> Response {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    match authenticate(&issuer, header) {
        Ok(user) => {
            let _ = req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(e) => {
            debug!(error = %e, path = %req.uri().path(), "request not authenticated");
            unauthorized()
        }
    }
}

fn authenticate(issuer: &TokenIssuer, header: &str) -> scoreline_auth::Result<AuthenticatedUser> {
    let token = bearer_token(header)?;
    let claims = issuer.verify(token)?;
    Ok(AuthenticatedUser {
        user_id: claims.user_id,
    })
}

/// `401 {"message": "Please authenticate"}`.
pub fn unauthorized() -> Response {
    message_response(StatusCode::UNAUTHORIZED, "Please authenticate")
}
