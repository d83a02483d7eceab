//! Authentication Models
//! Mission: Define user, profile, and token claim data structures

use crate::auth::token_store::TokenRecord;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub first_name: String,
    pub last_name: String,
    pub date_joined: String,
    pub is_active: bool,
}

/// Additional per-user information, created alongside the account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub date_of_birth: Option<String>,
    pub gender: Option<Gender>,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "O")]
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
            Gender::Other => "O",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "M" => Some(Gender::Male),
            "F" => Some(Gender::Female),
            "O" => Some(Gender::Other),
            _ => None,
        }
    }
}

/// JWT Claims payload
///
/// `jti` is a per-issuance nonce: two logins for the same user within the
/// same second must still produce distinct signed values, because the token
/// store looks records up by exact value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // subject (user id)
    pub exp: usize,  // expiration timestamp
    pub iat: usize,  // issued-at timestamp
    pub jti: String, // issuance nonce
}

/// The identity the middleware attaches to authenticated requests.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub user: User,
    pub token: TokenRecord,
}

/// Signup request body
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub profile: UserProfile,
}

/// User response (sanitized)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl UserResponse {
    pub fn from_user(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// Password change request body
#[derive(Debug, Deserialize)]
pub struct PasswordChangeRequest {
    pub old_password: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

/// Password reset OTP request body
#[derive(Debug, Deserialize)]
pub struct PasswordResetRequestBody {
    pub email: String,
}

/// Password reset (with OTP) request body
#[derive(Debug, Deserialize)]
pub struct PasswordResetBody {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}
