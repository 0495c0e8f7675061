//! In-process stand-in for the book catalog service.
//!
//! Serves the same HTTP surface as the real service under `/api`, with
//! cookie sessions (`sessionid`) and the real service's error shapes:
//! `{"error": ...}` from the hand-written endpoints, `{"detail": ...}` for
//! missing authentication and unknown objects, and field maps for
//! validation failures.

pub mod auth;
pub mod books;
pub mod notifications;
pub mod store;
pub mod users;

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub use store::{Book, BookInput, BookStatistics, Catalog, Notification, SystemStatistics, User, UserStatistics};

pub const SESSION_COOKIE: &str = "sessionid";

pub type Db = Arc<RwLock<Catalog>>;

pub fn app() -> Router {
    app_with_db(Arc::new(RwLock::new(Catalog::seeded())))
}

pub fn app_with_db(db: Db) -> Router {
    let api = Router::new()
        .route("/auth/register/", post(auth::register))
        .route("/auth/login/", post(auth::login))
        .route("/auth/logout/", post(auth::logout))
        .route("/auth/change_password/", post(auth::change_password))
        .route("/books/", get(books::list).post(books::create))
        .route("/books/read_books/", get(books::read_books))
        .route("/books/unread_books/", get(books::unread_books))
        .route("/books/statistics/", get(books::statistics))
        .route(
            "/books/{id}/",
            get(books::retrieve).put(books::update).delete(books::destroy),
        )
        .route("/books/{id}/toggle_read/", post(books::toggle_read))
        .route("/notifications/", get(notifications::list))
        .route("/notifications/mark_all_read/", post(notifications::mark_all_read))
        .route("/notifications/unread_count/", get(notifications::unread_count))
        .route(
            "/notifications/{id}/",
            get(notifications::retrieve).delete(notifications::destroy),
        )
        .route("/notifications/{id}/mark_read/", post(notifications::mark_read))
        .route("/users/", get(users::list))
        .route("/users/statistics/", get(users::statistics))
        .route("/users/{id}/", get(users::retrieve))
        .route("/statistics/", get(system_statistics));

    Router::new().nest("/api", api).with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Handler failures, rendered with the status and body shape the real
/// service uses for each case.
#[derive(Debug, thiserror::Error)]
pub enum ApiFailure {
    #[error("Authentication credentials were not provided.")]
    NotAuthenticated,
    #[error("Not found.")]
    NotFound,
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    BadRequest(&'static str),
    /// Field name to messages, like a rejected serializer.
    #[error("validation failed on {0}")]
    Validation(String, String),
    /// Body that is not JSON at all.
    #[error("{0}")]
    Malformed(String),
}

impl ApiFailure {
    pub fn invalid(field: &str, detail: &str) -> Self {
        ApiFailure::Validation(field.to_string(), detail.to_string())
    }
}

/// Handlers take `Result<Json<T>, JsonRejection>` and convert with `?` after
/// the session check, so unauthenticated requests still get 403 and bad
/// bodies get a 400 JSON body instead of axum's plain-text 422.
impl From<JsonRejection> for ApiFailure {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                let text = err.body_text();
                match missing_field(&text) {
                    Some(field) => ApiFailure::invalid(field, "This field is required."),
                    None => ApiFailure::invalid("non_field_errors", &text),
                }
            }
            other => ApiFailure::Malformed(format!("JSON parse error - {}", other.body_text())),
        }
    }
}

fn missing_field(text: &str) -> Option<&str> {
    let (_, rest) = text.split_once("missing field `")?;
    rest.split_once('`').map(|(field, _)| field)
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            ApiFailure::NotAuthenticated => {
                (StatusCode::FORBIDDEN, Json(json!({ "detail": message }))).into_response()
            }
            ApiFailure::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "detail": message }))).into_response()
            }
            ApiFailure::Unauthorized(_) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
            }
            ApiFailure::Forbidden(_) => {
                (StatusCode::FORBIDDEN, Json(json!({ "error": message }))).into_response()
            }
            ApiFailure::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiFailure::Validation(field, detail) => {
                (StatusCode::BAD_REQUEST, Json(json!({ field: [detail] }))).into_response()
            }
            ApiFailure::Malformed(_) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "detail": message }))).into_response()
            }
        }
    }
}

/// Session token from the `Cookie` header, if it parses.
pub fn session_token(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, token)| token.parse().ok())
}

pub async fn current_user(db: &Db, headers: &HeaderMap) -> Option<User> {
    let token = session_token(headers)?;
    db.read().await.session_user(token)
}

pub async fn require_user(db: &Db, headers: &HeaderMap) -> Result<User, ApiFailure> {
    current_user(db, headers)
        .await
        .ok_or(ApiFailure::NotAuthenticated)
}

async fn system_statistics(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<SystemStatistics>, ApiFailure> {
    let user = require_user(&db, &headers).await?;
    if !user.is_admin() {
        return Err(ApiFailure::Forbidden("Admin access required."));
    }
    let stats = db.read().await.system_statistics();
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn session_token_found_among_other_cookies() {
        let token = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("csrftoken=abc; sessionid={token}; theme=dark")).unwrap(),
        );
        assert_eq!(session_token(&headers), Some(token));
    }

    #[test]
    fn missing_field_is_read_from_rejection_text() {
        assert_eq!(
            missing_field("Failed to deserialize the JSON body into the target type: missing field `published_date` at line 1 column 30"),
            Some("published_date")
        );
        assert_eq!(missing_field("invalid type: integer `1`, expected a string"), None);
    }

    #[test]
    fn session_token_missing_or_malformed() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);
        headers.insert(header::COOKIE, HeaderValue::from_static("sessionid=nope"));
        assert_eq!(session_token(&headers), None);
    }
}
