//! Message Storage
//! Mission: Persist per-user chat history in SQLite

use crate::chat::models::Message;
use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::sync::Arc;
use uuid::Uuid;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    content TEXT NOT NULL,
    response TEXT,
    timestamp TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_messages_user_ts ON messages(user_id, timestamp DESC);
"#;

/// Chat message storage
pub struct MessageStore {
    conn: Arc<Mutex<Connection>>,
}

impl MessageStore {
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database at {}", db_path))?;

        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialize message schema")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
        Ok(Message {
            id: row.get(0)?,
            user_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
            content: row.get(2)?,
            response: row.get(3)?,
            timestamp: row.get(4)?,
        })
    }

    /// Store a new user message with no response yet.
    pub fn create(&self, user_id: &Uuid, content: &str) -> Result<Message> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock();

        conn.execute(
            "INSERT INTO messages (user_id, content, response, timestamp)
             VALUES (?1, ?2, NULL, ?3)",
            params![user_id.to_string(), content, now],
        )
        .context("Failed to insert message")?;

        Ok(Message {
            id: conn.last_insert_rowid(),
            user_id: *user_id,
            content: content.to_string(),
            response: None,
            timestamp: now,
        })
    }

    /// Attach the relay's answer to a stored message.
    pub fn set_response(&self, id: i64, response: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE messages SET response = ?1 WHERE id = ?2",
            params![response, id],
        )
        .context("Failed to store response")?;
        Ok(())
    }

    /// The user's most recent messages, newest first.
    pub fn recent_for_user(&self, user_id: &Uuid, limit: usize) -> Result<Vec<Message>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            "SELECT id, user_id, content, response, timestamp
             FROM messages WHERE user_id = ?1
             ORDER BY timestamp DESC, id DESC LIMIT ?2",
        )?;

        let messages = stmt
            .query_map(params![user_id.to_string(), limit as i64], Self::row_to_message)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(messages)
    }

    /// One page of history, newest first.
    pub fn history(&self, user_id: &Uuid, limit: usize, offset: usize) -> Result<Vec<Message>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            "SELECT id, user_id, content, response, timestamp
             FROM messages WHERE user_id = ?1
             ORDER BY timestamp DESC, id DESC LIMIT ?2 OFFSET ?3",
        )?;

        let messages = stmt
            .query_map(
                params![user_id.to_string(), limit as i64, offset as i64],
                Self::row_to_message,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(messages)
    }

    pub fn count_for_user(&self, user_id: &Uuid) -> Result<i64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE user_id = ?1",
            params![user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_store() -> (MessageStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();
        let store = MessageStore::new(db_path).unwrap();
        (store, temp_file)
    }

    #[test]
    fn test_create_and_set_response() {
        let (store, _temp) = create_test_store();
        let user = Uuid::new_v4();

        let message = store.create(&user, "I feel anxious").unwrap();
        assert!(message.response.is_none());

        store.set_response(message.id, "Tell me more").unwrap();

        let recent = store.recent_for_user(&user, 10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].response.as_deref(), Some("Tell me more"));
    }

    #[test]
    fn test_recent_for_user_is_limited_and_newest_first() {
        let (store, _temp) = create_test_store();
        let user = Uuid::new_v4();

        for i in 0..15 {
            store.create(&user, &format!("message {i}")).unwrap();
        }

        let recent = store.recent_for_user(&user, 10).unwrap();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].content, "message 14");
        assert_eq!(recent[9].content, "message 5");
    }

    #[test]
    fn test_history_pagination() {
        let (store, _temp) = create_test_store();
        let user = Uuid::new_v4();

        for i in 0..25 {
            store.create(&user, &format!("message {i}")).unwrap();
        }

        assert_eq!(store.count_for_user(&user).unwrap(), 25);

        let first_page = store.history(&user, 10, 0).unwrap();
        assert_eq!(first_page.len(), 10);
        assert_eq!(first_page[0].content, "message 24");

        let third_page = store.history(&user, 10, 20).unwrap();
        assert_eq!(third_page.len(), 5);
        assert_eq!(third_page[4].content, "message 0");
    }

    #[test]
    fn test_history_is_per_user() {
        let (store, _temp) = create_test_store();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store.create(&alice, "from alice").unwrap();
        store.create(&bob, "from bob").unwrap();

        let alice_history = store.history(&alice, 10, 0).unwrap();
        assert_eq!(alice_history.len(), 1);
        assert_eq!(alice_history[0].content, "from alice");
        assert_eq!(store.count_for_user(&bob).unwrap(), 1);
    }
}
