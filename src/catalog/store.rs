//! Catalog Storage
//! Mission: Persist the book and video library in SQLite

use crate::catalog::models::{Book, NewBook, NewVideo, NewVideoCategory, Video, VideoCategory};
use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::sync::Arc;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    description TEXT,
    published_date TEXT,
    isbn TEXT UNIQUE,
    language TEXT NOT NULL DEFAULT 'English',
    pages INTEGER,
    tag TEXT NOT NULL,
    cover_image TEXT,
    file TEXT,
    is_available INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_books_title ON books(title);

CREATE TABLE IF NOT EXISTS video_categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE NOT NULL,
    description TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS videos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    category_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    url TEXT NOT NULL,
    thumbnail TEXT NOT NULL,
    duration INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    FOREIGN KEY (category_id) REFERENCES video_categories(id)
);

CREATE INDEX IF NOT EXISTS idx_videos_category ON videos(category_id);
"#;

/// Book and video storage
pub struct CatalogStore {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogStore {
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database at {}", db_path))?;

        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialize catalog schema")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_book(row: &rusqlite::Row<'_>) -> rusqlite::Result<Book> {
        Ok(Book {
            id: row.get(0)?,
            title: row.get(1)?,
            author: row.get(2)?,
            description: row.get(3)?,
            published_date: row.get(4)?,
            isbn: row.get(5)?,
            language: row.get(6)?,
            pages: row.get(7)?,
            tag: row.get(8)?,
            cover_image: row.get(9)?,
            file: row.get(10)?,
            is_available: row.get::<_, i64>(11)? != 0,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }

    pub fn insert_book(&self, new: &NewBook) -> Result<Book> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock();

        conn.execute(
            "INSERT INTO books (title, author, description, published_date, isbn, language,
                                pages, tag, cover_image, file, is_available, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                new.title,
                new.author,
                new.description,
                new.published_date,
                new.isbn,
                new.language,
                new.pages,
                new.tag,
                new.cover_image,
                new.file,
                new.is_available as i64,
                now,
                now,
            ],
        )
        .context("Failed to insert book")?;

        Ok(Book {
            id: conn.last_insert_rowid(),
            title: new.title.clone(),
            author: new.author.clone(),
            description: new.description.clone(),
            published_date: new.published_date.clone(),
            isbn: new.isbn.clone(),
            language: new.language.clone(),
            pages: new.pages,
            tag: new.tag.clone(),
            cover_image: new.cover_image.clone(),
            file: new.file.clone(),
            is_available: new.is_available,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// List every book, ordered by title.
    pub fn list_books(&self) -> Result<Vec<Book>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            "SELECT id, title, author, description, published_date, isbn, language,
                    pages, tag, cover_image, file, is_available, created_at, updated_at
             FROM books ORDER BY title",
        )?;

        let books = stmt
            .query_map([], Self::row_to_book)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(books)
    }

    pub fn get_book(&self, id: i64) -> Result<Option<Book>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            "SELECT id, title, author, description, published_date, isbn, language,
                    pages, tag, cover_image, file, is_available, created_at, updated_at
             FROM books WHERE id = ?1",
        )?;

        match stmt.query_row(params![id], Self::row_to_book) {
            Ok(book) => Ok(Some(book)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn isbn_exists(&self, isbn: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM books WHERE isbn = ?1",
            params![isbn],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn insert_video_category(&self, new: &NewVideoCategory) -> Result<VideoCategory> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock();

        conn.execute(
            "INSERT INTO video_categories (name, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![new.name, new.description, now, now],
        )
        .context("Failed to insert video category")?;

        Ok(VideoCategory {
            id: conn.last_insert_rowid(),
            name: new.name.clone(),
            description: new.description.clone(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    pub fn list_video_categories(&self) -> Result<Vec<VideoCategory>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            "SELECT id, name, description, created_at, updated_at
             FROM video_categories ORDER BY name",
        )?;

        let categories = stmt
            .query_map([], |row| {
                Ok(VideoCategory {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    pub fn category_exists(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM video_categories WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn category_name_exists(&self, name: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM video_categories WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn insert_video(&self, new: &NewVideo) -> Result<Video> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock();

        conn.execute(
            "INSERT INTO videos (category_id, title, description, url, thumbnail, duration,
                                 created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                new.category_id,
                new.title,
                new.description,
                new.url,
                new.thumbnail,
                new.duration,
                now,
                now,
            ],
        )
        .context("Failed to insert video")?;

        Ok(Video {
            id: conn.last_insert_rowid(),
            category_id: new.category_id,
            title: new.title.clone(),
            description: new.description.clone(),
            url: new.url.clone(),
            thumbnail: new.thumbnail.clone(),
            duration: new.duration,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// List videos, optionally restricted to one category.
    pub fn list_videos(&self, category_id: Option<i64>) -> Result<Vec<Video>> {
        let conn = self.conn.lock();

        let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<Video> {
            Ok(Video {
                id: row.get(0)?,
                category_id: row.get(1)?,
                title: row.get(2)?,
                description: row.get(3)?,
                url: row.get(4)?,
                thumbnail: row.get(5)?,
                duration: row.get(6)?,
                created_at: row.get(7)?,
                updated_at: row.get(8)?,
            })
        };

        let videos = match category_id {
            Some(cid) => {
                let mut stmt = conn.prepare(
                    "SELECT id, category_id, title, description, url, thumbnail, duration,
                            created_at, updated_at
                     FROM videos WHERE category_id = ?1 ORDER BY id",
                )?;
                let rows = stmt.query_map(params![cid], map_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT id, category_id, title, description, url, thumbnail, duration,
                            created_at, updated_at
                     FROM videos ORDER BY id",
                )?;
                let rows = stmt.query_map([], map_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };

        Ok(videos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_store() -> (CatalogStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();
        let store = CatalogStore::new(db_path).unwrap();
        (store, temp_file)
    }

    fn sample_book(title: &str, isbn: Option<&str>) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: "Author".to_string(),
            description: None,
            published_date: None,
            isbn: isbn.map(|s| s.to_string()),
            language: "English".to_string(),
            pages: Some(320),
            tag: "self-help".to_string(),
            cover_image: None,
            file: None,
            is_available: true,
        }
    }

    #[test]
    fn test_insert_and_get_book() {
        let (store, _temp) = create_test_store();

        let book = store
            .insert_book(&sample_book("Feeling Good", Some("9780380810338")))
            .unwrap();
        assert!(book.id > 0);

        let fetched = store.get_book(book.id).unwrap().unwrap();
        assert_eq!(fetched.title, "Feeling Good");
        assert_eq!(fetched.pages, Some(320));
        assert!(fetched.is_available);

        assert!(store.get_book(9999).unwrap().is_none());
    }

    #[test]
    fn test_list_books_ordered_by_title() {
        let (store, _temp) = create_test_store();

        store.insert_book(&sample_book("Zen Mind", None)).unwrap();
        store.insert_book(&sample_book("Atomic Habits", None)).unwrap();

        let books = store.list_books().unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].title, "Atomic Habits");
        assert_eq!(books[1].title, "Zen Mind");
    }

    #[test]
    fn test_isbn_uniqueness() {
        let (store, _temp) = create_test_store();

        store
            .insert_book(&sample_book("First", Some("9780380810338")))
            .unwrap();

        assert!(store.isbn_exists("9780380810338").unwrap());
        assert!(!store.isbn_exists("1111111111").unwrap());
        assert!(store
            .insert_book(&sample_book("Second", Some("9780380810338")))
            .is_err());
    }

    #[test]
    fn test_videos_grouped_by_category() {
        let (store, _temp) = create_test_store();

        let mindfulness = store
            .insert_video_category(&NewVideoCategory {
                name: "Mindfulness".to_string(),
                description: None,
            })
            .unwrap();
        let sleep = store
            .insert_video_category(&NewVideoCategory {
                name: "Sleep".to_string(),
                description: Some("Sleep hygiene".to_string()),
            })
            .unwrap();

        assert!(store.category_exists(mindfulness.id).unwrap());
        assert!(store.category_name_exists("Sleep").unwrap());

        store
            .insert_video(&NewVideo {
                category_id: mindfulness.id,
                title: "Breathing basics".to_string(),
                description: None,
                url: "https://example.com/v1".to_string(),
                thumbnail: "https://example.com/t1".to_string(),
                duration: 300,
            })
            .unwrap();
        store
            .insert_video(&NewVideo {
                category_id: sleep.id,
                title: "Wind down".to_string(),
                description: None,
                url: "https://example.com/v2".to_string(),
                thumbnail: "https://example.com/t2".to_string(),
                duration: 600,
            })
            .unwrap();

        assert_eq!(store.list_videos(None).unwrap().len(), 2);

        let mindfulness_only = store.list_videos(Some(mindfulness.id)).unwrap();
        assert_eq!(mindfulness_only.len(), 1);
        assert_eq!(mindfulness_only[0].title, "Breathing basics");
    }
}
