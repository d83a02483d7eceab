//! Account API Endpoints
//! Mission: Signup, login, logout, profile, and password management

use crate::auth::{
    jwt::TokenIssuer,
    mailer::Mailer,
    models::{
        AuthedUser, LoginRequest, LoginResponse, PasswordChangeRequest, PasswordResetBody,
        PasswordResetRequestBody, SignupRequest, UserProfile, UserResponse,
    },
    token_store::TokenStore,
    user_store::UserStore,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use rand::Rng;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

const MIN_PASSWORD_LEN: usize = 8;

/// Shared account/auth state
#[derive(Clone)]
pub struct AuthState {
    pub user_store: Arc<UserStore>,
    pub token_store: Arc<TokenStore>,
    pub issuer: Arc<TokenIssuer>,
    pub mailer: Arc<Mailer>,
}

/// Signup endpoint - POST /api/accounts/signup
pub async fn signup(
    State(state): State<AuthState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Value>), AuthApiError> {
    let email = payload.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AuthApiError::InvalidEmail);
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(AuthApiError::WeakPassword);
    }

    if state
        .user_store
        .email_exists(email)
        .map_err(|_| AuthApiError::InternalError)?
    {
        return Err(AuthApiError::EmailTaken);
    }

    let user = state
        .user_store
        .create_user(email, &payload.password, &payload.first_name, &payload.last_name)
        .map_err(|e| {
            warn!("Failed to create user: {}", e);
            AuthApiError::InternalError
        })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": UserResponse::from_user(&user) })),
    ))
}

/// Login endpoint - POST /api/accounts/login
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthApiError> {
    info!("🔐 Login attempt: {}", payload.email);

    let user = state
        .user_store
        .verify_credentials(&payload.email, &payload.password)
        .map_err(|_| AuthApiError::InternalError)?
        .ok_or_else(|| {
            warn!("❌ Failed login attempt: {}", payload.email);
            AuthApiError::InvalidCredentials
        })?;

    let token = state
        .issuer
        .issue(&user)
        .map_err(|_| AuthApiError::InternalError)?;

    let profile = state
        .user_store
        .get_profile(&user.id)
        .map_err(|_| AuthApiError::InternalError)?
        .unwrap_or_default();

    info!("✅ Login successful: {}", user.email);

    Ok(Json(LoginResponse { token, profile }))
}

/// Logout endpoint - POST /api/accounts/logout
///
/// Revokes exactly the token the request was authenticated with; other
/// sessions the user holds stay valid.
pub async fn logout(
    State(state): State<AuthState>,
    Extension(authed): Extension<AuthedUser>,
) -> Result<Json<Value>, AuthApiError> {
    state
        .token_store
        .deactivate(&authed.token.id)
        .map_err(|_| AuthApiError::InternalError)?;

    info!("👋 Logout: {}", authed.user.email);

    Ok(Json(json!({ "message": "Logged out successfully." })))
}

/// Bearer-auth probe - GET /api/accounts/dummy
pub async fn dummy() -> Json<Value> {
    Json(json!({ "message": "Authenticated successfully!" }))
}

/// Get the authenticated user's profile - GET /api/accounts/profile
pub async fn get_profile(
    State(state): State<AuthState>,
    Extension(authed): Extension<AuthedUser>,
) -> Result<Json<UserProfile>, AuthApiError> {
    let profile = state
        .user_store
        .get_profile(&authed.user.id)
        .map_err(|_| AuthApiError::InternalError)?
        .ok_or(AuthApiError::ProfileNotFound)?;

    Ok(Json(profile))
}

/// Update the authenticated user's profile - PUT /api/accounts/profile
pub async fn update_profile(
    State(state): State<AuthState>,
    Extension(authed): Extension<AuthedUser>,
    Json(payload): Json<UserProfile>,
) -> Result<Json<UserProfile>, AuthApiError> {
    state
        .user_store
        .update_profile(&authed.user.id, &payload)
        .map_err(|_| AuthApiError::ProfileNotFound)?;

    Ok(Json(payload))
}

/// Change password - PUT /api/accounts/password/change
///
/// A successful change revokes every active token the user holds.
pub async fn change_password(
    State(state): State<AuthState>,
    Extension(authed): Extension<AuthedUser>,
    Json(payload): Json<PasswordChangeRequest>,
) -> Result<Json<Value>, AuthApiError> {
    let verified = state
        .user_store
        .verify_credentials(&authed.user.email, &payload.old_password)
        .map_err(|_| AuthApiError::InternalError)?;
    if verified.is_none() {
        return Err(AuthApiError::OldPasswordIncorrect);
    }

    if payload.new_password != payload.confirm_new_password {
        return Err(AuthApiError::PasswordMismatch);
    }
    if payload.new_password == payload.old_password {
        return Err(AuthApiError::PasswordReuse);
    }
    if payload.new_password.len() < MIN_PASSWORD_LEN {
        return Err(AuthApiError::WeakPassword);
    }

    state
        .user_store
        .set_password(&authed.user.id, &payload.new_password)
        .map_err(|_| AuthApiError::InternalError)?;

    let revoked = state
        .token_store
        .deactivate_for_user(&authed.user.id)
        .map_err(|_| AuthApiError::InternalError)?;

    info!(
        "🔑 Password changed for {}, revoked {} token(s)",
        authed.user.email, revoked
    );

    Ok(Json(json!({ "message": "Password updated successfully." })))
}

/// Request a password-reset OTP - POST /api/accounts/password/reset/request
pub async fn request_password_reset(
    State(state): State<AuthState>,
    Json(payload): Json<PasswordResetRequestBody>,
) -> Result<Json<Value>, AuthApiError> {
    let user = state
        .user_store
        .get_user_by_email(&payload.email)
        .map_err(|_| AuthApiError::InternalError)?
        .ok_or(AuthApiError::UnknownEmail)?;

    let otp = format!("{}", rand::thread_rng().gen_range(100_000..=999_999));

    state
        .mailer
        .send(
            &user.email,
            "Mindcare Password Reset OTP",
            &format!("Your OTP for password reset is: {}", otp),
        )
        .await
        .map_err(|e| {
            warn!("Failed to send reset OTP to {}: {}", user.email, e);
            AuthApiError::MailDeliveryFailed
        })?;

    // Only persist the OTP once the email actually went out.
    state
        .user_store
        .create_reset_otp(&user.id, &otp)
        .map_err(|_| AuthApiError::InternalError)?;

    Ok(Json(json!({ "message": "OTP has been sent to your email." })))
}

/// Reset password with an OTP - POST /api/accounts/password/reset
pub async fn reset_password(
    State(state): State<AuthState>,
    Json(payload): Json<PasswordResetBody>,
) -> Result<Json<Value>, AuthApiError> {
    let user = state
        .user_store
        .get_user_by_email(&payload.email)
        .map_err(|_| AuthApiError::InternalError)?
        .ok_or(AuthApiError::InvalidResetEmail)?;

    if payload.new_password.len() < MIN_PASSWORD_LEN {
        return Err(AuthApiError::WeakPassword);
    }

    let consumed = state
        .user_store
        .consume_reset_otp(&user.id, &payload.otp)
        .map_err(|_| AuthApiError::InternalError)?;
    if !consumed {
        return Err(AuthApiError::InvalidOtp);
    }

    state
        .user_store
        .set_password(&user.id, &payload.new_password)
        .map_err(|_| AuthApiError::InternalError)?;

    // A reset is a password change performed out-of-band; standing sessions
    // are revoked the same way.
    state
        .token_store
        .deactivate_for_user(&user.id)
        .map_err(|_| AuthApiError::InternalError)?;

    info!("🔑 Password reset completed for {}", user.email);

    Ok(Json(json!({
        "message": "Your password has been reset successfully."
    })))
}

/// Account API errors
#[derive(Debug)]
pub enum AuthApiError {
    InvalidCredentials,
    InvalidEmail,
    EmailTaken,
    WeakPassword,
    OldPasswordIncorrect,
    PasswordMismatch,
    PasswordReuse,
    UnknownEmail,
    InvalidResetEmail,
    InvalidOtp,
    ProfileNotFound,
    MailDeliveryFailed,
    InternalError,
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AuthApiError::InvalidCredentials => {
                (StatusCode::BAD_REQUEST, "Invalid login credentials.")
            }
            AuthApiError::InvalidEmail => (StatusCode::BAD_REQUEST, "Enter a valid email address."),
            AuthApiError::EmailTaken => (
                StatusCode::BAD_REQUEST,
                "A user with that email already exists.",
            ),
            AuthApiError::WeakPassword => (
                StatusCode::BAD_REQUEST,
                "Password must be at least 8 characters.",
            ),
            AuthApiError::OldPasswordIncorrect => {
                (StatusCode::BAD_REQUEST, "Old password is incorrect.")
            }
            AuthApiError::PasswordMismatch => (
                StatusCode::BAD_REQUEST,
                "The two new passwords do not match.",
            ),
            AuthApiError::PasswordReuse => {
                (StatusCode::BAD_REQUEST, "Old and New Password are same")
            }
            AuthApiError::UnknownEmail => (
                StatusCode::BAD_REQUEST,
                "User with this email does not exist.",
            ),
            AuthApiError::InvalidResetEmail => (StatusCode::BAD_REQUEST, "Invalid email address."),
            AuthApiError::InvalidOtp => (StatusCode::BAD_REQUEST, "Invalid OTP."),
            AuthApiError::ProfileNotFound => (StatusCode::NOT_FOUND, "User profile not found."),
            AuthApiError::MailDeliveryFailed => {
                (StatusCode::BAD_GATEWAY, "Failed to send OTP email.")
            }
            AuthApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
