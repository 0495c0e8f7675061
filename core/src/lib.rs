//! Async client for the book catalog REST API.
//!
//! # Overview
//! Every call goes through one `Gateway`. The gateway joins the base URL and a
//! relative path, merges caller headers over the defaults, always includes
//! session cookies, sends the request and classifies the response into a
//! decoded payload or an `ApiError`. `CatalogClient` layers one typed method
//! per endpoint on top.
//!
//! # Design
//! - `prepare` and `classify` are plain functions over `HttpRequest` /
//!   `HttpResponse` data, so the gateway's rules are testable without I/O.
//! - `Transport` is the I/O seam; `ReqwestTransport` is the production one
//!   and keeps the session cookie jar.
//! - Login state is returned as a `SessionStatus` value instead of being
//!   stored on the client.
//! - No retries. Timeouts only when `ClientConfig` sets them.

pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod session;
pub mod transport;
pub mod types;

pub use client::CatalogClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use gateway::{classify, Gateway, RequestOptions};
pub use http::{CredentialsMode, HttpMethod, HttpRequest, HttpResponse};
pub use session::{AuthOutcome, SessionStatus};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    Book, BookFilter, BookId, BookStatistics, ChangePasswordRequest, LoginRequest, LoginResponse,
    MarkAllReadResponse, MessageResponse, NewBook, Notification, NotificationId, RegisterRequest,
    RegisterResponse, SystemStatistics, UnreadCount, User, UserId, UserStatistics,
};
