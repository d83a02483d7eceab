//! Catalog API Endpoints
//! Mission: Book and video CRUD

use crate::catalog::models::{Book, NewBook, NewVideo, NewVideoCategory, Video, VideoCategory};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct VideoQuery {
    pub category_id: Option<i64>,
}

fn valid_isbn(isbn: &str) -> bool {
    (10..=13).contains(&isbn.len())
}

fn valid_media_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Create book - POST /api/books
pub async fn create_book(
    State(state): State<AppState>,
    Json(payload): Json<NewBook>,
) -> Result<(StatusCode, Json<Book>), CatalogApiError> {
    if payload.title.trim().is_empty() {
        return Err(CatalogApiError::MissingField("title"));
    }
    if payload.author.trim().is_empty() {
        return Err(CatalogApiError::MissingField("author"));
    }
    if payload.tag.trim().is_empty() {
        return Err(CatalogApiError::MissingField("tag"));
    }
    if let Some(pages) = payload.pages {
        if pages < 1 {
            return Err(CatalogApiError::InvalidPages);
        }
    }
    if let Some(isbn) = &payload.isbn {
        if !valid_isbn(isbn) {
            return Err(CatalogApiError::InvalidIsbn);
        }
        if state
            .catalog
            .isbn_exists(isbn)
            .map_err(|_| CatalogApiError::InternalError)?
        {
            return Err(CatalogApiError::DuplicateIsbn);
        }
    }

    let book = state.catalog.insert_book(&payload).map_err(|e| {
        warn!("Failed to insert book: {}", e);
        CatalogApiError::InternalError
    })?;

    info!("📚 Book created: {} ({})", book.title, book.id);

    Ok((StatusCode::CREATED, Json(book)))
}

/// List books - GET /api/books
pub async fn list_books(
    State(state): State<AppState>,
) -> Result<Json<Vec<Book>>, CatalogApiError> {
    let books = state
        .catalog
        .list_books()
        .map_err(|_| CatalogApiError::InternalError)?;
    Ok(Json(books))
}

/// Get one book - GET /api/books/:id
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Book>, CatalogApiError> {
    let book = state
        .catalog
        .get_book(id)
        .map_err(|_| CatalogApiError::InternalError)?
        .ok_or(CatalogApiError::BookNotFound)?;
    Ok(Json(book))
}

/// Create video category - POST /api/videos/categories
pub async fn create_video_category(
    State(state): State<AppState>,
    Json(payload): Json<NewVideoCategory>,
) -> Result<(StatusCode, Json<VideoCategory>), CatalogApiError> {
    if payload.name.trim().len() < 3 {
        return Err(CatalogApiError::CategoryNameTooShort);
    }
    if state
        .catalog
        .category_name_exists(payload.name.trim())
        .map_err(|_| CatalogApiError::InternalError)?
    {
        return Err(CatalogApiError::DuplicateCategory);
    }

    let category = state
        .catalog
        .insert_video_category(&payload)
        .map_err(|_| CatalogApiError::InternalError)?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// List video categories - GET /api/videos/categories
pub async fn list_video_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<VideoCategory>>, CatalogApiError> {
    let categories = state
        .catalog
        .list_video_categories()
        .map_err(|_| CatalogApiError::InternalError)?;
    Ok(Json(categories))
}

/// Create video - POST /api/videos
pub async fn create_video(
    State(state): State<AppState>,
    Json(payload): Json<NewVideo>,
) -> Result<(StatusCode, Json<Video>), CatalogApiError> {
    if payload.title.trim().is_empty() {
        return Err(CatalogApiError::MissingField("title"));
    }
    if !valid_media_url(&payload.url) {
        return Err(CatalogApiError::InvalidUrl);
    }
    if payload.duration < 1 {
        return Err(CatalogApiError::InvalidDuration);
    }
    if !state
        .catalog
        .category_exists(payload.category_id)
        .map_err(|_| CatalogApiError::InternalError)?
    {
        return Err(CatalogApiError::UnknownCategory);
    }

    let video = state
        .catalog
        .insert_video(&payload)
        .map_err(|_| CatalogApiError::InternalError)?;

    info!("🎬 Video created: {} ({})", video.title, video.id);

    Ok((StatusCode::CREATED, Json(video)))
}

/// List videos - GET /api/videos
pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<VideoQuery>,
) -> Result<Json<Vec<Video>>, CatalogApiError> {
    let videos = state
        .catalog
        .list_videos(query.category_id)
        .map_err(|_| CatalogApiError::InternalError)?;
    Ok(Json(videos))
}

/// Catalog API errors
#[derive(Debug)]
pub enum CatalogApiError {
    MissingField(&'static str),
    InvalidIsbn,
    DuplicateIsbn,
    InvalidPages,
    CategoryNameTooShort,
    DuplicateCategory,
    UnknownCategory,
    InvalidUrl,
    InvalidDuration,
    BookNotFound,
    InternalError,
}

impl IntoResponse for CatalogApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            CatalogApiError::MissingField(field) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "detail": format!("This field may not be blank: {field}") })),
                )
                    .into_response();
            }
            CatalogApiError::InvalidIsbn => (
                StatusCode::BAD_REQUEST,
                "ISBN must be between 10 and 13 characters long.",
            ),
            CatalogApiError::DuplicateIsbn => (
                StatusCode::BAD_REQUEST,
                "A book with that ISBN already exists.",
            ),
            CatalogApiError::InvalidPages => (
                StatusCode::BAD_REQUEST,
                "Number of pages must be at least 1",
            ),
            CatalogApiError::CategoryNameTooShort => (
                StatusCode::BAD_REQUEST,
                "Category name must be at least 3 characters long.",
            ),
            CatalogApiError::DuplicateCategory => (
                StatusCode::BAD_REQUEST,
                "A category with that name already exists.",
            ),
            CatalogApiError::UnknownCategory => {
                (StatusCode::BAD_REQUEST, "Video category not found.")
            }
            CatalogApiError::InvalidUrl => (
                StatusCode::BAD_REQUEST,
                "URL must be a valid HTTP or HTTPS link.",
            ),
            CatalogApiError::InvalidDuration => {
                (StatusCode::BAD_REQUEST, "Duration must be a positive integer.")
            }
            CatalogApiError::BookNotFound => (StatusCode::NOT_FOUND, "Book not found."),
            CatalogApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isbn_validation() {
        assert!(valid_isbn("0380810336"));
        assert!(valid_isbn("9780380810338"));
        assert!(!valid_isbn("123"));
        assert!(!valid_isbn("12345678901234"));
    }

    #[test]
    fn test_media_url_validation() {
        assert!(valid_media_url("https://example.com/video.mp4"));
        assert!(valid_media_url("http://example.com/video.mp4"));
        assert!(!valid_media_url("ftp://example.com/video.mp4"));
        assert!(!valid_media_url("example.com/video.mp4"));
    }

    #[test]
    fn test_catalog_error_responses() {
        let not_found = CatalogApiError::BookNotFound.into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let bad_isbn = CatalogApiError::InvalidIsbn.into_response();
        assert_eq!(bad_isbn.status(), StatusCode::BAD_REQUEST);

        let blank = CatalogApiError::MissingField("title").into_response();
        assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
    }
}
