use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::{current_user, session_token, ApiFailure, Db, SESSION_COOKIE};

#[derive(Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

pub async fn register(
    State(db): State<Db>,
    body: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiFailure> {
    let Json(input) = body?;
    if input.password.is_empty() {
        return Err(ApiFailure::invalid("non_field_errors", "Password is required for new users."));
    }
    if input.password != input.confirm_password {
        return Err(ApiFailure::invalid("non_field_errors", "Passwords do not match."));
    }

    let user = db
        .write()
        .await
        .create_user(&input.username, &input.email, &input.password)
        .ok_or_else(|| {
            ApiFailure::invalid("username", "user with this username already exists.")
        })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully.", "user": user })),
    ))
}

pub async fn login(
    State(db): State<Db>,
    body: Result<Json<LoginInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiFailure> {
    let Json(input) = body?;
    let mut catalog = db.write().await;
    let user = catalog
        .authenticate(&input.username, &input.password)
        .ok_or(ApiFailure::Unauthorized("Invalid credentials."))?;
    let token = catalog.open_session(user.id);

    let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly");
    let is_admin = user.is_admin();
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "message": "Login successful.", "user": user, "is_admin": is_admin })),
    ))
}

pub async fn logout(State(db): State<Db>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = session_token(&headers) {
        db.write().await.close_session(token);
    }
    let cookie = format!("{SESSION_COOKIE}=; Path=/; Max-Age=0");
    (
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "message": "Logout successful." })),
    )
}

pub async fn change_password(
    State(db): State<Db>,
    headers: HeaderMap,
    body: Result<Json<ChangePasswordInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiFailure> {
    let user = current_user(&db, &headers)
        .await
        .ok_or(ApiFailure::Unauthorized("Authentication required."))?;
    let Json(input) = body?;

    if input.new_password != input.confirm_new_password {
        return Err(ApiFailure::invalid("non_field_errors", "New passwords do not match."));
    }
    if input.current_password == input.new_password {
        return Err(ApiFailure::invalid("non_field_errors", "New password must be different from current password."));
    }

    let mut catalog = db.write().await;
    if !catalog.check_password(user.id, &input.current_password) {
        return Err(ApiFailure::BadRequest("Current password is incorrect."));
    }
    catalog.set_password(user.id, &input.new_password);

    Ok(Json(json!({ "message": "Password changed successfully." })))
}
