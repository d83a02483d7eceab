//! User Storage
//! Mission: Store user accounts, profiles, and reset OTPs with SQLite

use crate::auth::models::{Gender, User, UserProfile};
use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::info;
use uuid::Uuid;

/// User storage with SQLite backend
pub struct UserStore {
    db_path: String,
}

impl UserStore {
    /// Create a new user store and initialize database
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
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                date_joined TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS user_profiles (
                user_id TEXT PRIMARY KEY,
                date_of_birth TEXT,
                gender TEXT,
                phone_number TEXT,
                profile_picture TEXT,
                bio TEXT,
                FOREIGN KEY (user_id) REFERENCES users(id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS password_reset_otps (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                otp TEXT NOT NULL,
                created_at TEXT NOT NULL,
                is_used INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (user_id) REFERENCES users(id)
            )",
            [],
        )?;

        Ok(())
    }

    fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
            email: row.get(1)?,
            password_hash: row.get(2)?,
            first_name: row.get(3)?,
            last_name: row.get(4)?,
            date_joined: row.get(5)?,
            is_active: row.get::<_, i64>(6)? != 0,
        })
    }

    /// Create a new user. An empty profile row is created in the same
    /// transaction, mirroring account creation side effects elsewhere in the
    /// platform.
    pub fn create_user(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User> {
        let password_hash = hash(password, DEFAULT_COST).context("Failed to hash password")?;

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            date_joined: Utc::now().to_rfc3339(),
            is_active: true,
        };

        let mut conn = Connection::open(&self.db_path)?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO users (id, email, password_hash, first_name, last_name, date_joined, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)",
            params![
                user.id.to_string(),
                user.email,
                user.password_hash,
                user.first_name,
                user.last_name,
                user.date_joined,
            ],
        )
        .context("Failed to insert user")?;

        tx.execute(
            "INSERT INTO user_profiles (user_id) VALUES (?1)",
            params![user.id.to_string()],
        )
        .context("Failed to insert user profile")?;

        tx.commit()?;

        info!("✅ Created user: {}", user.email);

        Ok(user)
    }

    /// Get user by email
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = Connection::open(&self.db_path)?;

        let mut stmt = conn.prepare(
            "SELECT id, email, password_hash, first_name, last_name, date_joined, is_active
             FROM users WHERE email = ?1",
        )?;

        let user_result = stmt.query_row(params![email], Self::row_to_user);

        match user_result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get user by ID
    pub fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        let conn = Connection::open(&self.db_path)?;

        let mut stmt = conn.prepare(
            "SELECT id, email, password_hash, first_name, last_name, date_joined, is_active
             FROM users WHERE id = ?1",
        )?;

        let user_result = stmt.query_row(params![id.to_string()], Self::row_to_user);

        match user_result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn email_exists(&self, email: &str) -> Result<bool> {
        let conn = Connection::open(&self.db_path)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE email = ?1",
            params![email],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Verify login credentials. Returns the user only when the account
    /// exists, is active, and the password matches.
    pub fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.get_user_by_email(email)? else {
            return Ok(None);
        };

        if !user.is_active {
            return Ok(None);
        }

        let valid = verify(password, &user.password_hash).context("Failed to verify password")?;
        Ok(valid.then_some(user))
    }

    /// Replace a user's password hash.
    pub fn set_password(&self, user_id: &Uuid, new_password: &str) -> Result<()> {
        let password_hash = hash(new_password, DEFAULT_COST).context("Failed to hash password")?;

        let conn = Connection::open(&self.db_path)?;
        let updated = conn.execute(
            "UPDATE users SET password_hash = ?1 WHERE id = ?2",
            params![password_hash, user_id.to_string()],
        )?;

        if updated == 0 {
            anyhow::bail!("User not found");
        }
        Ok(())
    }

    /// Delete a user by ID
    pub fn delete_user(&self, user_id: &Uuid) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

        let rows_affected = conn.execute(
            "DELETE FROM users WHERE id = ?1",
            params![user_id.to_string()],
        )?;

        if rows_affected == 0 {
            anyhow::bail!("User not found");
        }

        conn.execute(
            "DELETE FROM user_profiles WHERE user_id = ?1",
            params![user_id.to_string()],
        )?;

        info!("🗑️  Deleted user: {}", user_id);
        Ok(())
    }

    /// Get the profile attached to a user.
    pub fn get_profile(&self, user_id: &Uuid) -> Result<Option<UserProfile>> {
        let conn = Connection::open(&self.db_path)?;

        let mut stmt = conn.prepare(
            "SELECT date_of_birth, gender, phone_number, profile_picture, bio
             FROM user_profiles WHERE user_id = ?1",
        )?;

        let profile_result = stmt.query_row(params![user_id.to_string()], |row| {
            Ok(UserProfile {
                date_of_birth: row.get(0)?,
                gender: row
                    .get::<_, Option<String>>(1)?
                    .and_then(|g| Gender::from_str(&g)),
                phone_number: row.get(2)?,
                profile_picture: row.get(3)?,
                bio: row.get(4)?,
            })
        });

        match profile_result {
            Ok(profile) => Ok(Some(profile)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite a user's profile fields.
    pub fn update_profile(&self, user_id: &Uuid, profile: &UserProfile) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;
        let updated = conn.execute(
            "UPDATE user_profiles
             SET date_of_birth = ?1, gender = ?2, phone_number = ?3,
                 profile_picture = ?4, bio = ?5
             WHERE user_id = ?6",
            params![
                profile.date_of_birth,
                profile.gender.map(|g| g.as_str().to_string()),
                profile.phone_number,
                profile.profile_picture,
                profile.bio,
                user_id.to_string(),
            ],
        )?;

        if updated == 0 {
            anyhow::bail!("User profile not found");
        }
        Ok(())
    }

    /// Record a password-reset OTP for a user.
    pub fn create_reset_otp(&self, user_id: &Uuid, otp: &str) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO password_reset_otps (id, user_id, otp, created_at, is_used)
             VALUES (?1, ?2, ?3, ?4, 0)",
            params![
                Uuid::new_v4().to_string(),
                user_id.to_string(),
                otp,
                Utc::now().to_rfc3339(),
            ],
        )
        .context("Failed to insert reset OTP")?;
        Ok(())
    }

    /// Atomically consume an unused OTP. Returns false when no matching
    /// unused OTP exists.
    pub fn consume_reset_otp(&self, user_id: &Uuid, otp: &str) -> Result<bool> {
        let conn = Connection::open(&self.db_path)?;
        let consumed = conn.execute(
            "UPDATE password_reset_otps SET is_used = 1
             WHERE user_id = ?1 AND otp = ?2 AND is_used = 0",
            params![user_id.to_string(), otp],
        )?;
        Ok(consumed > 0)
    }
}
