//! Worker routes
//!
//! A worker's `business_id` is the carwash that employs them, so access is
//! decided against that carwash's owner.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::managed_carwash;
use crate::api::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::{AuthContext, RequireAuth};
use crate::domain::*;
use crate::error::ApiResult;

#[derive(Debug, Deserialize, Default)]
pub struct WorkerListQuery {
    #[serde(default)]
    pub available: bool,
}

/// The worker themself, or whoever manages their carwash.
async fn self_or_manager(state: &AppState, auth: &AuthContext, worker_id: Uuid) -> ApiResult<Worker> {
    let worker = state.services.workers.get_by_id(worker_id).await?;
    if auth.user_id != worker.id {
        managed_carwash(state, auth, worker.business_id).await?;
    }
    Ok(worker)
}

/// POST /workers
pub async fn create_worker(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<CreateWorkerRequest>,
) -> ApiResult<impl IntoResponse> {
    managed_carwash(&state, &auth, req.business_id).await?;
    Ok(Created(state.services.workers.create_worker(req).await?))
}

/// GET /carwashes/:id/workers[?available=true]
pub async fn list_for_carwash(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<WorkerListQuery>,
    auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    managed_carwash(&state, &auth, id).await?;
    let workers = if query.available {
        state.services.workers.list_available_by_business(id).await?
    } else {
        state.services.workers.list_by_business(id).await?
    };
    Ok(DataResponse::new(workers))
}

/// GET /workers/:id
pub async fn get_worker(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    Ok(DataResponse::new(self_or_manager(&state, &auth, id).await?))
}

/// PATCH /workers/:id
pub async fn update_worker(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
    Json(patch): Json<WorkerPatch>,
) -> ApiResult<impl IntoResponse> {
    self_or_manager(&state, &auth, id).await?;
    Ok(DataResponse::new(state.services.workers.update_details(id, patch).await?))
}

/// PUT /workers/:id/account-status
pub async fn set_account_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<StatusUpdateRequest>,
) -> ApiResult<impl IntoResponse> {
    let worker = state.services.workers.get_by_id(id).await?;
    managed_carwash(&state, &auth, worker.business_id).await?;
    Ok(DataResponse::new(
        state.services.workers.set_account_status(id, &req.status).await?,
    ))
}

/// PUT /workers/:id/work-status
pub async fn set_work_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<WorkStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    self_or_manager(&state, &auth, id).await?;
    Ok(DataResponse::new(
        state.services.workers.set_work_status(id, &req.work_status).await?,
    ))
}

/// POST /workers/:id/orders/:order_id
pub async fn assign_to_order(
    State(state): State<Arc<AppState>>,
    Path((id, order_id)): Path<(Uuid, Uuid)>,
    auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    let worker = state.services.workers.get_by_id(id).await?;
    managed_carwash(&state, &auth, worker.business_id).await?;
    Ok(DataResponse::new(state.services.workers.assign_to_order(id, order_id).await?))
}

/// DELETE /workers/:id/orders/:order_id
pub async fn remove_from_order(
    State(state): State<Arc<AppState>>,
    Path((id, order_id)): Path<(Uuid, Uuid)>,
    auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    self_or_manager(&state, &auth, id).await?;
    Ok(DataResponse::new(
        state.services.workers.remove_from_order(id, order_id).await?,
    ))
}
