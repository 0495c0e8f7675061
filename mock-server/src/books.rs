use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;

use crate::store::{book_statistics, Book, BookInput, BookStatistics};
use crate::{require_user, ApiFailure, Db};

/// `is_read` is compared as text like the real service does: only
/// `true` (any case) selects read books.
#[derive(Debug, Default, Deserialize)]
pub struct BookQuery {
    pub is_read: Option<String>,
    pub search: Option<String>,
}

impl BookQuery {
    fn matches(&self, book: &Book) -> bool {
        if let Some(is_read) = &self.is_read {
            if book.is_read != (is_read.to_lowercase() == "true") {
                return false;
            }
        }
        match self.search.as_deref() {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                [&book.title, &book.author, &book.description]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&term))
            }
            _ => true,
        }
    }
}

fn validate(input: &BookInput) -> Result<(), ApiFailure> {
    if input.title.trim().is_empty() {
        return Err(ApiFailure::invalid("title", "This field may not be blank."));
    }
    if input.author.trim().is_empty() {
        return Err(ApiFailure::invalid("author", "This field may not be blank."));
    }
    Ok(())
}

pub async fn list(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<BookQuery>,
) -> Result<Json<Vec<Book>>, ApiFailure> {
    let user = require_user(&db, &headers).await?;
    let books = db.read().await.books_visible_to(&user);
    Ok(Json(books.into_iter().filter(|b| query.matches(b)).collect()))
}

pub async fn create(
    State(db): State<Db>,
    headers: HeaderMap,
    body: Result<Json<BookInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), ApiFailure> {
    let user = require_user(&db, &headers).await?;
    let Json(input) = body?;
    validate(&input)?;
    let book = db.write().await.create_book(&user, input);
    Ok((StatusCode::CREATED, Json(book)))
}

pub async fn retrieve(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<Book>, ApiFailure> {
    let user = require_user(&db, &headers).await?;
    let book = db.read().await.book(&user, id);
    book.map(Json).ok_or(ApiFailure::NotFound)
}

pub async fn update(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    body: Result<Json<BookInput>, JsonRejection>,
) -> Result<Json<Book>, ApiFailure> {
    let user = require_user(&db, &headers).await?;
    let Json(input) = body?;
    validate(&input)?;
    let book = db.write().await.update_book(&user, id, input);
    book.map(Json).ok_or(ApiFailure::NotFound)
}

pub async fn destroy(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiFailure> {
    let user = require_user(&db, &headers).await?;
    if db.write().await.delete_book(&user, id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiFailure::NotFound)
    }
}

pub async fn toggle_read(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<Book>, ApiFailure> {
    let user = require_user(&db, &headers).await?;
    let book = db.write().await.toggle_read(&user, id);
    book.map(Json).ok_or(ApiFailure::NotFound)
}

pub async fn read_books(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Vec<Book>>, ApiFailure> {
    filtered(db, headers, true).await
}

pub async fn unread_books(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Vec<Book>>, ApiFailure> {
    filtered(db, headers, false).await
}

async fn filtered(db: Db, headers: HeaderMap, is_read: bool) -> Result<Json<Vec<Book>>, ApiFailure> {
    let user = require_user(&db, &headers).await?;
    let books = db.read().await.books_visible_to(&user);
    Ok(Json(books.into_iter().filter(|b| b.is_read == is_read).collect()))
}

pub async fn statistics(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<BookStatistics>, ApiFailure> {
    let user = require_user(&db, &headers).await?;
    let books = db.read().await.books_visible_to(&user);
    Ok(Json(book_statistics(&books)))
}
