//! Token Issuer and Validator
//! Mission: Sign bearer tokens and run the validation state machine

use crate::auth::errors::AuthFailure;
use crate::auth::models::{AuthedUser, Claims, User};
use crate::auth::token_store::TokenStore;
use crate::auth::user_store::UserStore;
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Default validity window for issued tokens.
pub const DEFAULT_VALIDITY_HOURS: i64 = 24;

/// Issues signed tokens bound to a fixed validity window, persisting one
/// store record per issuance before the token is handed out.
pub struct TokenIssuer {
    secret: String,
    validity_hours: i64,
    store: Arc<TokenStore>,
}

impl TokenIssuer {
    /// Create an issuer with the process-wide signing secret.
    pub fn new(secret: String, store: Arc<TokenStore>) -> Self {
        Self {
            secret,
            validity_hours: DEFAULT_VALIDITY_HOURS,
            store,
        }
    }

    /// Override the validity window.
    pub fn with_validity_hours(mut self, hours: i64) -> Self {
        self.validity_hours = hours;
        self
    }

    /// Sign a token for an already-verified user.
    ///
    /// The identity is not re-checked here; credential verification happens
    /// at the login boundary. A store-write failure is fatal to the call.
    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.validity_hours);

        let claims = Claims {
            sub: user.id.to_string(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to sign token")?;

        // The record must exist before the caller ever sees the token.
        self.store.create(&user.id, &token, now, expires_at)?;

        debug!("Issued token for user {}, expires {}", user.id, expires_at);

        Ok(token)
    }
}

/// Validates presented tokens: signature, claim expiry, store record,
/// store expiry (with lazy revocation), then identity resolution.
pub struct TokenValidator {
    secret: String,
    store: Arc<TokenStore>,
    users: Arc<UserStore>,
}

impl TokenValidator {
    pub fn new(secret: String, store: Arc<TokenStore>, users: Arc<UserStore>) -> Self {
        Self {
            secret,
            store,
            users,
        }
    }

    /// Run one independent validation pass over a presented token.
    pub fn validate(&self, token: &str) -> Result<AuthedUser, AuthFailure> {
        // Signature and claim-embedded expiry. This needs no store access,
        // so never-persisted or stale tokens fail before any I/O.
        let claims = self.decode_claims(token)?;

        // The store must still hold an active record for this exact value.
        let record = self
            .store
            .find_active_by_value(token)
            .map_err(AuthFailure::Store)?
            .ok_or(AuthFailure::NotFoundOrInactive)?;

        // Store-side expiry: lazily revoke the row the first time it is
        // observed past its window.
        if record.has_expired(Utc::now()) {
            self.store.deactivate(&record.id).map_err(AuthFailure::Store)?;
            return Err(AuthFailure::Expired);
        }

        // The account may have been removed after issuance.
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthFailure::InvalidToken)?;
        let user = self
            .users
            .get_user_by_id(&user_id)
            .map_err(AuthFailure::Store)?
            .ok_or(AuthFailure::UserNotFound)?;

        debug!("Validated token for user {}", user.email);

        Ok(AuthedUser {
            user,
            token: record,
        })
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, AuthFailure> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthFailure::Expired,
            _ => AuthFailure::InvalidToken,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::{params, Connection};
    use tempfile::NamedTempFile;

    struct TestAuth {
        issuer: TokenIssuer,
        validator: TokenValidator,
        users: Arc<UserStore>,
        tokens: Arc<TokenStore>,
        temp: NamedTempFile,
    }

    fn setup() -> TestAuth {
        let temp = NamedTempFile::new().unwrap();
        let db_path = temp.path().to_str().unwrap();

        let users = Arc::new(UserStore::new(db_path).unwrap());
        let tokens = Arc::new(TokenStore::new(db_path).unwrap());

        let issuer = TokenIssuer::new("test-secret-key-12345".to_string(), tokens.clone());
        let validator = TokenValidator::new(
            "test-secret-key-12345".to_string(),
            tokens.clone(),
            users.clone(),
        );

        TestAuth {
            issuer,
            validator,
            users,
            tokens,
            temp,
        }
    }

    fn create_test_user(users: &UserStore) -> User {
        users
            .create_user("testuser@example.com", "password123", "Test", "User")
            .unwrap()
    }

    #[test]
    fn test_issue_then_validate_round_trip() {
        let auth = setup();
        let user = create_test_user(&auth.users);

        let token = auth.issuer.issue(&user).unwrap();
        assert!(!token.is_empty());

        let authed = auth.validator.validate(&token).unwrap();
        assert_eq!(authed.user.id, user.id);
        assert_eq!(authed.user.email, user.email);
        assert_eq!(authed.token.token, token);
        assert!(authed.token.is_active);
    }

    #[test]
    fn test_issuance_persists_active_record() {
        let auth = setup();
        let user = create_test_user(&auth.users);

        let token = auth.issuer.issue(&user).unwrap();

        let record = auth.tokens.find_active_by_value(&token).unwrap().unwrap();
        assert_eq!(record.user_id, user.id);
        assert!(record.expires_at > record.created_at);
    }

    #[test]
    fn test_expired_claim_rejected() {
        let auth = setup();
        let user = create_test_user(&auth.users);

        // Issue a token whose claim window already closed.
        let issuer = TokenIssuer::new("test-secret-key-12345".to_string(), auth.tokens.clone())
            .with_validity_hours(-2);
        let token = issuer.issue(&user).unwrap();

        let result = auth.validator.validate(&token);
        assert!(matches!(result, Err(AuthFailure::Expired)));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let auth = setup();
        let user = create_test_user(&auth.users);

        let token = auth.issuer.issue(&user).unwrap();

        let mut bytes = token.clone().into_bytes();
        let mid = bytes.len() / 2;
        bytes[mid] = if bytes[mid] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();
        assert_ne!(tampered, token);

        let result = auth.validator.validate(&tampered);
        assert!(matches!(result, Err(AuthFailure::InvalidToken)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let auth = setup();
        let user = create_test_user(&auth.users);

        let token = auth.issuer.issue(&user).unwrap();

        let other_validator = TokenValidator::new(
            "a-completely-different-secret".to_string(),
            auth.tokens.clone(),
            auth.users.clone(),
        );

        let result = other_validator.validate(&token);
        assert!(matches!(result, Err(AuthFailure::InvalidToken)));
    }

    #[test]
    fn test_unpersisted_token_rejected() {
        let auth = setup();
        let user = create_test_user(&auth.users);

        // Structurally valid token signed with the right key, but never
        // written to the store.
        let claims = Claims {
            sub: user.id.to_string(),
            exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
            iat: Utc::now().timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test-secret-key-12345".as_bytes()),
        )
        .unwrap();

        let result = auth.validator.validate(&token);
        assert!(matches!(result, Err(AuthFailure::NotFoundOrInactive)));
    }

    #[test]
    fn test_revoked_token_rejected() {
        let auth = setup();
        let user = create_test_user(&auth.users);

        let token = auth.issuer.issue(&user).unwrap();
        let record = auth.tokens.find_active_by_value(&token).unwrap().unwrap();
        auth.tokens.deactivate(&record.id).unwrap();

        let result = auth.validator.validate(&token);
        assert!(matches!(result, Err(AuthFailure::NotFoundOrInactive)));
    }

    #[test]
    fn test_store_expiry_triggers_lazy_revocation() {
        let auth = setup();
        let user = create_test_user(&auth.users);

        let token = auth.issuer.issue(&user).unwrap();

        // Backdate the store row while the claim window is still open, as if
        // the record had been revoked server-side with a shorter window.
        let conn = Connection::open(auth.temp.path()).unwrap();
        conn.execute(
            "UPDATE tokens SET expires_at = ?1 WHERE token = ?2",
            params![(Utc::now() - Duration::hours(1)).to_rfc3339(), token],
        )
        .unwrap();

        let result = auth.validator.validate(&token);
        assert!(matches!(result, Err(AuthFailure::Expired)));

        // The expired row was deactivated as a side effect.
        assert!(auth.tokens.find_active_by_value(&token).unwrap().is_none());
    }

    #[test]
    fn test_deleted_user_rejected() {
        let auth = setup();
        let user = create_test_user(&auth.users);

        let token = auth.issuer.issue(&user).unwrap();
        auth.users.delete_user(&user.id).unwrap();

        let result = auth.validator.validate(&token);
        assert!(matches!(result, Err(AuthFailure::UserNotFound)));
    }

    #[test]
    fn test_two_issuances_are_distinct_and_both_valid() {
        let auth = setup();
        let user = create_test_user(&auth.users);

        let first = auth.issuer.issue(&user).unwrap();
        let second = auth.issuer.issue(&user).unwrap();

        // Same user, same second - the jti nonce keeps them distinct.
        assert_ne!(first, second);

        assert!(auth.validator.validate(&first).is_ok());
        assert!(auth.validator.validate(&second).is_ok());

        // Revoking one leaves the other valid.
        let record = auth.tokens.find_active_by_value(&first).unwrap().unwrap();
        auth.tokens.deactivate(&record.id).unwrap();

        assert!(matches!(
            auth.validator.validate(&first),
            Err(AuthFailure::NotFoundOrInactive)
        ));
        assert!(auth.validator.validate(&second).is_ok());
    }
}
