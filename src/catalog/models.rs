//! Catalog Models
//! Mission: Book and video library data structures

use serde::{Deserialize, Serialize};

/// Book catalog entry
#[derive(Debug, Clone, Serialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub published_date: Option<String>,
    pub isbn: Option<String>,
    pub language: String,
    pub pages: Option<i64>,
    pub tag: String,
    pub cover_image: Option<String>,
    pub file: Option<String>,
    pub is_available: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Book creation request body
#[derive(Debug, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub pages: Option<i64>,
    pub tag: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_language() -> String {
    "English".to_string()
}

fn default_true() -> bool {
    true
}

/// Video category
#[derive(Debug, Clone, Serialize)]
pub struct VideoCategory {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Video category creation request body
#[derive(Debug, Deserialize)]
pub struct NewVideoCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Video catalog entry
#[derive(Debug, Clone, Serialize)]
pub struct Video {
    pub id: i64,
    pub category_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub thumbnail: String,
    pub duration: i64, // seconds
    pub created_at: String,
    pub updated_at: String,
}

/// Video creation request body
#[derive(Debug, Deserialize)]
pub struct NewVideo {
    pub category_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    pub thumbnail: String,
    pub duration: i64,
}
