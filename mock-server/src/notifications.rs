use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};

use crate::store::Notification;
use crate::{require_user, ApiFailure, Db};

pub async fn list(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Vec<Notification>>, ApiFailure> {
    let user = require_user(&db, &headers).await?;
    let notifications = db.read().await.notifications_visible_to(&user);
    Ok(Json(notifications))
}

pub async fn retrieve(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<Notification>, ApiFailure> {
    let user = require_user(&db, &headers).await?;
    let notification = db.read().await.notification(&user, id);
    notification.map(Json).ok_or(ApiFailure::NotFound)
}

pub async fn destroy(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiFailure> {
    let user = require_user(&db, &headers).await?;
    if db.write().await.delete_notification(&user, id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiFailure::NotFound)
    }
}

pub async fn mark_read(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<Notification>, ApiFailure> {
    let user = require_user(&db, &headers).await?;
    let notification = db.write().await.mark_notification_read(&user, id);
    notification.map(Json).ok_or(ApiFailure::NotFound)
}

pub async fn mark_all_read(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiFailure> {
    let user = require_user(&db, &headers).await?;
    let count = db.write().await.mark_all_read(&user);
    Ok(Json(json!({
        "message": format!("{count} notification(s) marked as read."),
        "count": count,
    })))
}

pub async fn unread_count(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiFailure> {
    let user = require_user(&db, &headers).await?;
    let count = db.read().await.unread_count(&user);
    Ok(Json(json!({ "unread_count": count })))
}
