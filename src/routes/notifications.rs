//! Notification routes
//!
//! Endpoints for the caller's in-app inbox: list, unread count, mark read.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{DataResponse, MessageResponse};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::NotificationQuery;
use crate::error::ApiResult;

/// GET /notifications[?limit=50]
///
/// Newest first. The limit is clamped to 1..=100.
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NotificationQuery>,
    auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    let notifications = state
        .services
        .notifications
        .list_for_user(auth.user_id, query.limit)
        .await?;
    Ok(DataResponse::new(notifications))
}

/// GET /notifications/unread-count
pub async fn get_unread_count(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    Ok(DataResponse::new(state.services.notifications.unread_count(auth.user_id).await?))
}

/// PUT /notifications/:id/read
pub async fn mark_notification_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    state.services.notifications.mark_read(id, auth.user_id).await?;
    Ok(MessageResponse::new("notification marked as read"))
}

/// PUT /notifications/read-all
pub async fn mark_all_read(State(state): State<Arc<AppState>>, auth: RequireAuth) -> ApiResult<impl IntoResponse> {
    let updated = state.services.notifications.mark_all_read(auth.user_id).await?;
    Ok(MessageResponse::with_count("notifications marked as read", updated))
}
