//! Catalog ⇄ shop transfer endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{post, put};
use axum::{Json, Router};
use shopline_core::dto::{AllocateRequest, AllocationResponse, ReallocateRequest};

use crate::error::ApiResult;
use crate::routes::CallerIdentity;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/allocations", post(allocate))
        .route(
            "/api/allocations/{shop_stock_id}",
            put(reallocate).delete(deallocate),
        )
}

/// POST /api/allocations
pub async fn allocate(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Json(request): Json<AllocateRequest>,
) -> ApiResult<(StatusCode, Json<AllocationResponse>)> {
    let caller = identity.require_staff()?;
    let response = state
        .db
        .allocations()
        .allocate(caller, request.stock_id, request.shop_id, request.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// PUT /api/allocations/{shop_stock_id}
pub async fn reallocate(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Path(shop_stock_id): Path<i64>,
    Json(request): Json<ReallocateRequest>,
) -> ApiResult<Json<AllocationResponse>> {
    let caller = identity.require_staff()?;
    let response = state
        .db
        .allocations()
        .reallocate(caller, shop_stock_id, request.new_quantity, request.expected_version)
        .await?;
    Ok(Json(response))
}

/// DELETE /api/allocations/{shop_stock_id}
pub async fn deallocate(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Path(shop_stock_id): Path<i64>,
) -> ApiResult<Json<AllocationResponse>> {
    let caller = identity.require_staff()?;
    let response = state.db.allocations().deallocate(caller, shop_stock_id).await?;
    Ok(Json(response))
}
