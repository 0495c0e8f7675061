use axum::http::{self, header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, Book, Notification};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: &str) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(body.to_string()).unwrap()
}

fn empty_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<String> {
    json_request(method, uri, cookie, "")
}

/// Log in and return the `sessionid=...` pair to send back as a cookie.
async fn login(app: &Router, username: &str, password: &str) -> String {
    let body = format!(r#"{{"username":"{username}","password":"{password}"}}"#);
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/auth/login/", None, &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    set_cookie.split(';').next().unwrap().to_string()
}

async fn register(app: &Router, username: &str) {
    let body = format!(
        r#"{{"username":"{username}","email":"{username}@example.com","password":"pw","confirm_password":"pw"}}"#
    );
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/auth/register/", None, &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
}

const DUNE: &str = r#"{"title":"Dune","author":"Frank Herbert","description":"Desert planet","published_date":"1965-08-01"}"#;

// --- auth ---

#[tokio::test]
async fn login_with_bad_password_returns_error_field() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/auth/login/",
            None,
            r#"{"username":"admin","password":"nope"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"], "Invalid credentials.");
}

#[tokio::test]
async fn login_sets_session_cookie_and_reports_admin() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/auth/login/",
            None,
            r#"{"username":"admin","password":"admin"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("sessionid="));
    let body: Value = body_json(resp).await;
    assert_eq!(body["is_admin"], true);
    assert_eq!(body["user"]["username"], "admin");
}

#[tokio::test]
async fn register_mismatched_passwords_has_no_error_field() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/auth/register/",
            None,
            r#"{"username":"x","email":"x@example.com","password":"a","confirm_password":"b"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert!(body.get("error").is_none());
    assert_eq!(body["non_field_errors"][0], "Passwords do not match.");
}

#[tokio::test]
async fn logout_ends_session() {
    let app = app();
    let cookie = login(&app, "admin", "admin").await;

    let resp = app
        .clone()
        .oneshot(empty_request("POST", "/api/auth/logout/", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(empty_request("GET", "/api/books/", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn change_password_requires_session() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/auth/change_password/",
            None,
            r#"{"current_password":"a","new_password":"b","confirm_new_password":"b"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"], "Authentication required.");
}

#[tokio::test]
async fn change_password_then_login_with_new_one() {
    let app = app();
    register(&app, "reader").await;
    let cookie = login(&app, "reader", "pw").await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/change_password/",
            Some(&cookie),
            r#"{"current_password":"pw","new_password":"pw2","confirm_new_password":"pw2"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    login(&app, "reader", "pw2").await;
}

// --- books ---

#[tokio::test]
async fn books_require_authentication() {
    let resp = app()
        .oneshot(empty_request("GET", "/api/books/", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = body_json(resp).await;
    assert_eq!(body["detail"], "Authentication credentials were not provided.");
}

#[tokio::test]
async fn create_book_returns_201() {
    let app = app();
    let cookie = login(&app, "admin", "admin").await;
    let resp = app
        .oneshot(json_request("POST", "/api/books/", Some(&cookie), DUNE))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let book: Book = body_json(resp).await;
    assert_eq!(book.title, "Dune");
    assert!(!book.is_read);
    assert_eq!(book.added_by_username, "admin");
}

#[tokio::test]
async fn create_book_blank_title_is_validation_error() {
    let app = app();
    let cookie = login(&app, "admin", "admin").await;
    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/books/",
            Some(&cookie),
            r#"{"title":" ","author":"A","published_date":"2000-01-01"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body["title"][0], "This field may not be blank.");
}

#[tokio::test]
async fn create_book_missing_field_is_field_map() {
    let app = app();
    let cookie = login(&app, "admin", "admin").await;
    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/books/",
            Some(&cookie),
            r#"{"title":"T","author":"A"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body, serde_json::json!({ "published_date": ["This field is required."] }));
}

#[tokio::test]
async fn create_book_invalid_json_is_400_detail() {
    let app = app();
    let cookie = login(&app, "admin", "admin").await;
    let resp = app
        .oneshot(json_request("POST", "/api/books/", Some(&cookie), "{not json"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert!(body["detail"].as_str().unwrap().starts_with("JSON parse error"));
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn bad_body_without_session_is_still_forbidden() {
    let resp = app()
        .oneshot(json_request("POST", "/api/books/", None, r#"{"not_title":1}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = body_json(resp).await;
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn update_book_missing_field_is_field_map() {
    let app = app();
    let cookie = login(&app, "admin", "admin").await;
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/books/", Some(&cookie), DUNE))
        .await
        .unwrap();
    let book: Book = body_json(resp).await;
    let resp = app
        .oneshot(json_request(
            "PUT",
            &format!("/api/books/{}/", book.id),
            Some(&cookie),
            r#"{"author":"A","published_date":"2000-01-01"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body, serde_json::json!({ "title": ["This field is required."] }));
}

#[tokio::test]
async fn login_missing_password_is_field_map() {
    let resp = app()
        .oneshot(json_request("POST", "/api/auth/login/", None, r#"{"username":"admin"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body, serde_json::json!({ "password": ["This field is required."] }));
}

#[tokio::test]
async fn get_book_not_found() {
    let app = app();
    let cookie = login(&app, "admin", "admin").await;
    let resp = app
        .oneshot(empty_request("GET", "/api/books/999/", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["detail"], "Not found.");
}

#[tokio::test]
async fn list_books_filters_by_read_flag_and_search() {
    let app = app();
    let cookie = login(&app, "admin", "admin").await;
    for body in [
        DUNE,
        r#"{"title":"The Hobbit","author":"Tolkien","description":"A fantasy","published_date":"1937-09-21","is_read":true}"#,
    ] {
        app.clone()
            .oneshot(json_request("POST", "/api/books/", Some(&cookie), body))
            .await
            .unwrap();
    }

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/api/books/?is_read=false", Some(&cookie)))
        .await
        .unwrap();
    let unread: Vec<Book> = body_json(resp).await;
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].title, "Dune");

    let resp = app
        .oneshot(empty_request("GET", "/api/books/?search=FANTASY", Some(&cookie)))
        .await
        .unwrap();
    let found: Vec<Book> = body_json(resp).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "The Hobbit");
}

#[tokio::test]
async fn readers_cannot_see_admin_books() {
    let app = app();
    let admin = login(&app, "admin", "admin").await;
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/books/", Some(&admin), DUNE))
        .await
        .unwrap();
    let book: Book = body_json(resp).await;

    register(&app, "reader").await;
    let reader = login(&app, "reader", "pw").await;
    let resp = app
        .oneshot(empty_request("GET", &format!("/api/books/{}/", book.id), Some(&reader)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_book_returns_empty_204() {
    let app = app();
    let cookie = login(&app, "admin", "admin").await;
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/books/", Some(&cookie), DUNE))
        .await
        .unwrap();
    let book: Book = body_json(resp).await;

    let resp = app
        .oneshot(empty_request("DELETE", &format!("/api/books/{}/", book.id), Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn statistics_route_is_not_shadowed_by_book_id() {
    let app = app();
    let cookie = login(&app, "admin", "admin").await;
    let resp = app
        .oneshot(empty_request("GET", "/api/books/statistics/", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let stats: Value = body_json(resp).await;
    assert_eq!(stats["total_books"], 0);
    assert_eq!(stats["read_percentage"], 0.0);
}

// --- notifications ---

#[tokio::test]
async fn notifications_lifecycle() {
    let app = app();
    let cookie = login(&app, "admin", "admin").await;
    app.clone()
        .oneshot(json_request("POST", "/api/books/", Some(&cookie), DUNE))
        .await
        .unwrap();

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/api/notifications/", Some(&cookie)))
        .await
        .unwrap();
    let notifications: Vec<Notification> = body_json(resp).await;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].notification_type, "book_added");
    let id = notifications[0].id;

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/api/notifications/unread_count/", Some(&cookie)))
        .await
        .unwrap();
    let count: Value = body_json(resp).await;
    assert_eq!(count["unread_count"], 1);

    let resp = app
        .clone()
        .oneshot(empty_request(
            "POST",
            &format!("/api/notifications/{id}/mark_read/"),
            Some(&cookie),
        ))
        .await
        .unwrap();
    let marked: Notification = body_json(resp).await;
    assert!(marked.is_read);

    let resp = app
        .oneshot(empty_request("POST", "/api/notifications/mark_all_read/", Some(&cookie)))
        .await
        .unwrap();
    let body: Value = body_json(resp).await;
    assert_eq!(body["count"], 0);
    assert_eq!(body["message"], "0 notification(s) marked as read.");
}

// --- admin ---

#[tokio::test]
async fn system_statistics_admin_only() {
    let app = app();
    register(&app, "reader").await;
    let reader = login(&app, "reader", "pw").await;

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/api/statistics/", Some(&reader)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error"], "Admin access required.");

    let admin = login(&app, "admin", "admin").await;
    let resp = app
        .oneshot(empty_request("GET", "/api/statistics/", Some(&admin)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["user_stats"]["total_users"], 2);
    assert_eq!(body["user_stats"]["admin_users"], 1);
}

#[tokio::test]
async fn users_list_is_empty_for_readers() {
    let app = app();
    register(&app, "reader").await;
    let reader = login(&app, "reader", "pw").await;
    let resp = app
        .oneshot(empty_request("GET", "/api/users/", Some(&reader)))
        .await
        .unwrap();
    let users: Vec<Value> = body_json(resp).await;
    assert!(users.is_empty());
}
