//! Typed operations for the book catalog API.
//!
//! # Design
//! `CatalogClient` holds only a `Gateway` and carries no session state of its
//! own. Every operation builds a relative path, hands it to the gateway with
//! the right method and body, logs the outcome at `debug` and returns the
//! decoded value. The cookie jar inside the transport is the only thing that
//! remembers a login; `login`/`logout` report what they did as an
//! `AuthOutcome` for the caller to keep.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::gateway::{Gateway, RequestOptions};
use crate::session::AuthOutcome;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{
    Book, BookFilter, BookId, BookStatistics, ChangePasswordRequest, LoginRequest, LoginResponse,
    MarkAllReadResponse, MessageResponse, NewBook, Notification, NotificationId, RegisterRequest,
    RegisterResponse, SystemStatistics, UnreadCount, User, UserId, UserStatistics,
};

/// Async client for the book catalog API.
#[derive(Debug, Clone)]
pub struct CatalogClient<T = ReqwestTransport> {
    gateway: Gateway<T>,
}

impl CatalogClient<ReqwestTransport> {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        Ok(Self {
            gateway: Gateway::from_config(config)?,
        })
    }

    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(&ClientConfig::from_env()?)
    }
}

impl<T: Transport> CatalogClient<T> {
    pub fn with_gateway(gateway: Gateway<T>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Gateway<T> {
        &self.gateway
    }

    async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        self.gateway.request(path, RequestOptions::get()).await
    }

    async fn post<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        self.gateway.request(path, RequestOptions::post()).await
    }

    async fn send_json<B, R>(&self, path: &str, options: RequestOptions, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.gateway.request(path, options.json(body)?).await
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    pub async fn register(&self, input: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        let response: RegisterResponse = self
            .send_json("/auth/register/", RequestOptions::post(), input)
            .await?;
        tracing::debug!(user = %response.user.username, "user registered");
        Ok(response)
    }

    /// Log in and return the session the server established. The session
    /// cookie is kept by the transport for later calls.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthOutcome, ApiError> {
        let credentials = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self
            .send_json("/auth/login/", RequestOptions::post(), &credentials)
            .await?;
        tracing::debug!(user = %response.user.username, is_admin = response.is_admin, "login successful");
        Ok(response.into())
    }

    pub async fn logout(&self) -> Result<AuthOutcome, ApiError> {
        let response: MessageResponse = self.post("/auth/logout/").await?;
        tracing::debug!("logout successful");
        Ok(response.into())
    }

    pub async fn change_password(
        &self,
        input: &ChangePasswordRequest,
    ) -> Result<MessageResponse, ApiError> {
        let response: MessageResponse = self
            .send_json("/auth/change_password/", RequestOptions::post(), input)
            .await?;
        tracing::debug!("password changed");
        Ok(response)
    }

    // -----------------------------------------------------------------------
    // Books
    // -----------------------------------------------------------------------

    pub async fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>, ApiError> {
        let path = match filter.to_query() {
            Some(query) => format!("/books/?{query}"),
            None => "/books/".to_string(),
        };
        let books: Vec<Book> = self.get(&path).await?;
        tracing::debug!(count = books.len(), "books retrieved");
        Ok(books)
    }

    pub async fn get_book(&self, id: BookId) -> Result<Book, ApiError> {
        let book: Book = self.get(&format!("/books/{id}/")).await?;
        tracing::debug!(id, title = %book.title, "book retrieved");
        Ok(book)
    }

    pub async fn create_book(&self, input: &NewBook) -> Result<Book, ApiError> {
        let book: Book = self
            .send_json("/books/", RequestOptions::post(), input)
            .await?;
        tracing::debug!(id = book.id, title = %book.title, "book created");
        Ok(book)
    }

    /// Replace every writable field of book `id`.
    pub async fn update_book(&self, id: BookId, input: &NewBook) -> Result<Book, ApiError> {
        let book: Book = self
            .send_json(&format!("/books/{id}/"), RequestOptions::put(), input)
            .await?;
        tracing::debug!(id, "book updated");
        Ok(book)
    }

    pub async fn delete_book(&self, id: BookId) -> Result<(), ApiError> {
        self.gateway
            .request::<()>(&format!("/books/{id}/"), RequestOptions::delete())
            .await?;
        tracing::debug!(id, "book deleted");
        Ok(())
    }

    pub async fn toggle_book_read(&self, id: BookId) -> Result<Book, ApiError> {
        let book: Book = self.post(&format!("/books/{id}/toggle_read/")).await?;
        tracing::debug!(id, is_read = book.is_read, "book read status toggled");
        Ok(book)
    }

    pub async fn read_books(&self) -> Result<Vec<Book>, ApiError> {
        let books: Vec<Book> = self.get("/books/read_books/").await?;
        tracing::debug!(count = books.len(), "read books retrieved");
        Ok(books)
    }

    pub async fn unread_books(&self) -> Result<Vec<Book>, ApiError> {
        let books: Vec<Book> = self.get("/books/unread_books/").await?;
        tracing::debug!(count = books.len(), "unread books retrieved");
        Ok(books)
    }

    pub async fn book_statistics(&self) -> Result<BookStatistics, ApiError> {
        let stats: BookStatistics = self.get("/books/statistics/").await?;
        tracing::debug!(total = stats.total_books, read = stats.read_books, "book statistics");
        Ok(stats)
    }

    // -----------------------------------------------------------------------
    // Notifications
    // -----------------------------------------------------------------------

    pub async fn list_notifications(&self) -> Result<Vec<Notification>, ApiError> {
        let notifications: Vec<Notification> = self.get("/notifications/").await?;
        tracing::debug!(count = notifications.len(), "notifications retrieved");
        Ok(notifications)
    }

    pub async fn get_notification(&self, id: NotificationId) -> Result<Notification, ApiError> {
        let notification: Notification = self.get(&format!("/notifications/{id}/")).await?;
        tracing::debug!(id, "notification retrieved");
        Ok(notification)
    }

    pub async fn delete_notification(&self, id: NotificationId) -> Result<(), ApiError> {
        self.gateway
            .request::<()>(&format!("/notifications/{id}/"), RequestOptions::delete())
            .await?;
        tracing::debug!(id, "notification deleted");
        Ok(())
    }

    pub async fn mark_notification_read(
        &self,
        id: NotificationId,
    ) -> Result<Notification, ApiError> {
        let notification: Notification =
            self.post(&format!("/notifications/{id}/mark_read/")).await?;
        tracing::debug!(id, "notification marked as read");
        Ok(notification)
    }

    pub async fn mark_all_notifications_read(&self) -> Result<MarkAllReadResponse, ApiError> {
        let response: MarkAllReadResponse = self.post("/notifications/mark_all_read/").await?;
        tracing::debug!(count = response.count, "all notifications marked as read");
        Ok(response)
    }

    pub async fn unread_notification_count(&self) -> Result<u64, ApiError> {
        let response: UnreadCount = self.get("/notifications/unread_count/").await?;
        tracing::debug!(unread = response.unread_count, "unread notification count");
        Ok(response.unread_count)
    }

    // -----------------------------------------------------------------------
    // Users and system statistics (admin)
    // -----------------------------------------------------------------------

    /// All users for an admin session; an empty list for anyone else.
    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let users: Vec<User> = self.get("/users/").await?;
        tracing::debug!(count = users.len(), "users retrieved");
        Ok(users)
    }

    pub async fn get_user(&self, id: UserId) -> Result<User, ApiError> {
        let user: User = self.get(&format!("/users/{id}/")).await?;
        tracing::debug!(id, username = %user.username, "user retrieved");
        Ok(user)
    }

    pub async fn user_statistics(&self) -> Result<UserStatistics, ApiError> {
        let stats: UserStatistics = self.get("/users/statistics/").await?;
        tracing::debug!(total = stats.total_users, "user statistics");
        Ok(stats)
    }

    pub async fn system_statistics(&self) -> Result<SystemStatistics, ApiError> {
        let stats: SystemStatistics = self.get("/statistics/").await?;
        tracing::debug!(
            books = stats.book_stats.total_books,
            users = stats.user_stats.total_users,
            notifications = stats.total_notifications,
            "system statistics"
        );
        Ok(stats)
    }
}
