//! Request and response shapes for the catalog API.
//!
//! # Design
//! These mirror the server's serializers but are defined independently of the
//! mock-server crate; integration tests catch drift between the two. Fields
//! the server computes (`view_count`, `added_by_username`, display labels,
//! timestamps) default when absent so older servers still decode. Required
//! fields stay required so a missing one is a decode error.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type BookId = u64;
pub type NotificationId = u64;
pub type UserId = u64;

// ---------------------------------------------------------------------------
// Users and auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterResponse {
    pub message: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub message: String,
    pub user: User,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

/// Body of endpoints that only acknowledge, such as logout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Books
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    pub published_date: NaiveDate,
    #[serde(default)]
    pub isbn: Option<String>,
    pub is_read: bool,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub added_by: Option<UserId>,
    #[serde(default)]
    pub added_by_username: Option<String>,
    #[serde(default)]
    pub is_read_display: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for creating a book, and for replacing one with PUT.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    pub published_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default)]
    pub is_read: bool,
}

/// Query filters for listing books. Unset fields are left out of the query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub is_read: Option<bool>,
    /// Case-insensitive match against title, author and description.
    pub search: Option<String>,
}

impl BookFilter {
    pub fn read(is_read: bool) -> Self {
        Self {
            is_read: Some(is_read),
            ..Self::default()
        }
    }

    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Self::default()
        }
    }

    /// `key=value` pairs, form-encoded, or `None` when nothing is set.
    pub fn to_query(&self) -> Option<String> {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        let mut any = false;
        if let Some(is_read) = self.is_read {
            query.append_pair("is_read", if is_read { "true" } else { "false" });
            any = true;
        }
        if let Some(search) = &self.search {
            query.append_pair("search", search);
            any = true;
        }
        any.then(|| query.finish())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookStatistics {
    pub total_books: u64,
    pub read_books: u64,
    pub unread_books: u64,
    pub read_percentage: f64,
    pub unread_percentage: f64,
    #[serde(default)]
    pub most_read_books: Vec<Book>,
    #[serde(default)]
    pub most_viewed_books: Vec<Book>,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(default)]
    pub user: Option<UserId>,
    #[serde(default)]
    pub user_username: Option<String>,
    pub title: String,
    pub message: String,
    pub notification_type: String,
    #[serde(default)]
    pub notification_type_display: Option<String>,
    #[serde(default)]
    pub book_recommendation: Option<BookId>,
    #[serde(default)]
    pub book_title: Option<String>,
    #[serde(default)]
    pub book_author: Option<String>,
    pub is_read: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarkAllReadResponse {
    pub message: String,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnreadCount {
    pub unread_count: u64,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserStatistics {
    pub total_users: u64,
    pub admin_users: u64,
    pub regular_users: u64,
    #[serde(default)]
    pub users: Vec<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemStatistics {
    pub book_stats: BookStatistics,
    pub user_stats: UserStatistics,
    pub total_notifications: u64,
    pub read_notifications: u64,
    pub unread_notifications: u64,
}
