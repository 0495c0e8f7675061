use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};

use crate::store::{User, UserStatistics};
use crate::{require_user, ApiFailure, Db};

pub async fn list(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<User>>, ApiFailure> {
    let user = require_user(&db, &headers).await?;
    let users = db.read().await.users_visible_to(&user);
    Ok(Json(users))
}

pub async fn retrieve(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<User>, ApiFailure> {
    let viewer = require_user(&db, &headers).await?;
    let users = db.read().await.users_visible_to(&viewer);
    users
        .into_iter()
        .find(|u| u.id == id)
        .map(Json)
        .ok_or(ApiFailure::NotFound)
}

pub async fn statistics(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<UserStatistics>, ApiFailure> {
    let user = require_user(&db, &headers).await?;
    if !user.is_admin() {
        return Err(ApiFailure::Forbidden("Admin access required"));
    }
    let stats = db.read().await.user_statistics();
    Ok(Json(stats))
}
