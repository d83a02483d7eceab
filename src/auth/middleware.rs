//! Authentication Middleware
//! Mission: Guard API endpoints with bearer token validation

use crate::auth::{errors::AuthFailure, jwt::TokenValidator};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// Rejection raised at the HTTP boundary.
#[derive(Debug)]
pub enum AuthRejection {
    MissingCredentials,
    Failed(AuthFailure),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::MissingCredentials => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "detail": "Authentication credentials were not provided." })),
            )
                .into_response(),
            AuthRejection::Failed(failure) => failure.into_response(),
        }
    }
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

/// Auth middleware for endpoints that mandate authentication.
///
/// A missing header or wrong scheme is rejected before the validator runs;
/// a presented credential is validated and its specific failure reason is
/// surfaced to the caller.
pub async fn auth_middleware(
    State(validator): State<Arc<TokenValidator>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let token = bearer_token(&req).ok_or(AuthRejection::MissingCredentials)?;

    let authed = validator
        .validate(&token)
        .map_err(AuthRejection::Failed)?;

    // Make the identity available to handlers downstream.
    req.extensions_mut().insert(authed);

    Ok(next.run(req).await)
}

/// Optional auth middleware for endpoints that permit anonymous access.
///
/// Absence of a credential passes the request through unauthenticated, but a
/// credential that is presented is still validated and rejected on failure.
pub async fn optional_auth_middleware(
    State(validator): State<Arc<TokenValidator>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    if let Some(token) = bearer_token(&req) {
        let authed = validator
            .validate(&token)
            .map_err(AuthRejection::Failed)?;
        req.extensions_mut().insert(authed);
    }

    Ok(next.run(req).await)
}
