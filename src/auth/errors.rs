//! Authentication failure taxonomy
//! Mission: One specific, caller-visible reason per rejected token

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Why a presented token was rejected.
///
/// The first four variants are authentication-semantic and map to 401 with
/// their exact reason preserved; `Store` is an infrastructure fault and maps
/// to 503 so callers never mistake an outage for a bad token.
#[derive(Debug)]
pub enum AuthFailure {
    InvalidToken,
    Expired,
    NotFoundOrInactive,
    UserNotFound,
    Store(anyhow::Error),
}

impl AuthFailure {
    pub fn detail(&self) -> &'static str {
        match self {
            AuthFailure::InvalidToken => "Invalid token",
            AuthFailure::Expired => "Token has expired",
            AuthFailure::NotFoundOrInactive => "Token not found or inactive",
            AuthFailure::UserNotFound => "User not found",
            AuthFailure::Store(_) => "Authentication store unavailable",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthFailure::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.detail())
    }
}

impl IntoResponse for AuthFailure {
    fn into_response(self) -> Response {
        if let AuthFailure::Store(e) = &self {
            error!("Auth store failure: {e:#}");
        }

        (self.status(), Json(json!({ "detail": self.detail() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failure_statuses() {
        assert_eq!(AuthFailure::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthFailure::Expired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthFailure::NotFoundOrInactive.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthFailure::UserNotFound.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthFailure::Store(anyhow::anyhow!("disk gone")).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_auth_failure_details_match_api_contract() {
        assert_eq!(AuthFailure::InvalidToken.detail(), "Invalid token");
        assert_eq!(AuthFailure::Expired.detail(), "Token has expired");
        assert_eq!(
            AuthFailure::NotFoundOrInactive.detail(),
            "Token not found or inactive"
        );
        assert_eq!(AuthFailure::UserNotFound.detail(), "User not found");
    }

    #[test]
    fn test_auth_failure_responses() {
        let expired = AuthFailure::Expired.into_response();
        assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);

        let store = AuthFailure::Store(anyhow::anyhow!("io")).into_response();
        assert_eq!(store.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
