//! Token Storage
//! Mission: Durable record of every issued bearer token

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use tracing::debug;
use uuid::Uuid;

/// One issued token. Rows are never deleted; only `is_active` ever changes,
/// and only from true to false.
#[derive(Debug, Clone)]
pub struct TokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

impl TokenRecord {
    pub fn has_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Token storage with SQLite backend
pub struct TokenStore {
    db_path: String,
}

impl TokenStore {
    /// Create a new token store and initialize database
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    /// Initialize database schema
    fn init_db(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS tokens (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                token TEXT UNIQUE NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tokens_user_active
             ON tokens(user_id, is_active)",
            [],
        )?;

        Ok(())
    }

    /// Persist a newly issued token as active.
    pub fn create(
        &self,
        user_id: &Uuid,
        token: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<TokenRecord> {
        let record = TokenRecord {
            id: Uuid::new_v4(),
            user_id: *user_id,
            token: token.to_string(),
            created_at,
            expires_at,
            is_active: true,
        };

        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO tokens (id, user_id, token, created_at, expires_at, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, 1)",
            params![
                record.id.to_string(),
                record.user_id.to_string(),
                record.token,
                record.created_at.to_rfc3339(),
                record.expires_at.to_rfc3339(),
            ],
        )
        .context("Failed to insert token")?;

        Ok(record)
    }

    /// Find a token by its exact signed value. Inactive rows are treated the
    /// same as missing rows.
    pub fn find_active_by_value(&self, token: &str) -> Result<Option<TokenRecord>> {
        let conn = Connection::open(&self.db_path)?;

        let mut stmt = conn.prepare(
            "SELECT id, user_id, token, created_at, expires_at, is_active
             FROM tokens WHERE token = ?1 AND is_active = 1",
        )?;

        let record_result = stmt.query_row(params![token], |row| {
            Ok(TokenRecord {
                id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
                user_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
                token: row.get(2)?,
                created_at: DateTime::parse_from_rfc3339(&row.get::<_, String>(3)?)
                    .unwrap()
                    .with_timezone(&Utc),
                expires_at: DateTime::parse_from_rfc3339(&row.get::<_, String>(4)?)
                    .unwrap()
                    .with_timezone(&Utc),
                is_active: row.get::<_, i64>(5)? != 0,
            })
        });

        match record_result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Mark a token inactive. Idempotent: deactivating an already-inactive
    /// token is a no-op, not an error.
    pub fn deactivate(&self, id: &Uuid) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "UPDATE tokens SET is_active = 0 WHERE id = ?1",
            params![id.to_string()],
        )
        .context("Failed to deactivate token")?;

        debug!("Deactivated token {}", id);
        Ok(())
    }

    /// Revoke every active token a user holds (password change, account
    /// lockout). Returns the number of tokens revoked.
    pub fn deactivate_for_user(&self, user_id: &Uuid) -> Result<usize> {
        let conn = Connection::open(&self.db_path)?;
        let revoked = conn.execute(
            "UPDATE tokens SET is_active = 0 WHERE user_id = ?1 AND is_active = 1",
            params![user_id.to_string()],
        )?;

        if revoked > 0 {
            debug!("Revoked {} active token(s) for user {}", revoked, user_id);
        }
        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::NamedTempFile;

    fn create_test_store() -> (TokenStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();
        let store = TokenStore::new(db_path).unwrap();
        (store, temp_file)
    }

    #[test]
    fn test_create_and_find() {
        let (store, _temp) = create_test_store();
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let record = store
            .create(&user_id, "signed.token.value", now, now + Duration::hours(24))
            .unwrap();
        assert!(record.is_active);
        assert_eq!(record.user_id, user_id);

        let found = store.find_active_by_value("signed.token.value").unwrap();
        assert!(found.is_some());

        let found = found.unwrap();
        assert_eq!(found.id, record.id);
        assert_eq!(found.token, "signed.token.value");
        assert!(found.expires_at > found.created_at);
    }

    #[test]
    fn test_unknown_value_not_found() {
        let (store, _temp) = create_test_store();
        assert!(store.find_active_by_value("nope").unwrap().is_none());
    }

    #[test]
    fn test_inactive_treated_as_missing() {
        let (store, _temp) = create_test_store();
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let record = store
            .create(&user_id, "tok", now, now + Duration::hours(1))
            .unwrap();
        store.deactivate(&record.id).unwrap();

        assert!(store.find_active_by_value("tok").unwrap().is_none());
    }

    #[test]
    fn test_deactivate_idempotent() {
        let (store, _temp) = create_test_store();
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let record = store
            .create(&user_id, "tok", now, now + Duration::hours(1))
            .unwrap();

        store.deactivate(&record.id).unwrap();
        store.deactivate(&record.id).unwrap();

        assert!(store.find_active_by_value("tok").unwrap().is_none());
    }

    #[test]
    fn test_deactivate_for_user_revokes_all_active() {
        let (store, _temp) = create_test_store();
        let user_id = Uuid::new_v4();
        let other_user = Uuid::new_v4();
        let now = Utc::now();

        store
            .create(&user_id, "tok-1", now, now + Duration::hours(1))
            .unwrap();
        store
            .create(&user_id, "tok-2", now, now + Duration::hours(1))
            .unwrap();
        store
            .create(&other_user, "tok-3", now, now + Duration::hours(1))
            .unwrap();

        let revoked = store.deactivate_for_user(&user_id).unwrap();
        assert_eq!(revoked, 2);

        assert!(store.find_active_by_value("tok-1").unwrap().is_none());
        assert!(store.find_active_by_value("tok-2").unwrap().is_none());
        assert!(store.find_active_by_value("tok-3").unwrap().is_some());

        // Nothing left to revoke the second time around.
        assert_eq!(store.deactivate_for_user(&user_id).unwrap(), 0);
    }

    #[test]
    fn test_expiry_helper() {
        let (store, _temp) = create_test_store();
        let now = Utc::now();

        let record = store
            .create(&Uuid::new_v4(), "tok", now, now + Duration::hours(24))
            .unwrap();

        assert!(!record.has_expired(now + Duration::hours(23)));
        assert!(record.has_expired(now + Duration::hours(25)));
    }
}
