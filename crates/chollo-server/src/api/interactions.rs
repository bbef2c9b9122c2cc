//! Vote and report handlers, one thin layer over the reconciler.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Extension, Json,
};
use chollo_core::VoteDirection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, require_identity, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct VoteRequest {
    pub direction: VoteDirection,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct VoteView {
    pub vote: Option<VoteDirection>,
    pub upvotes: i32,
    pub downvotes: i32,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct ReportView {
    pub reported: bool,
    pub unavailable_reports: i32,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct InteractionStateView {
    pub vote: Option<VoteDirection>,
    pub reported_unavailable: bool,
}

/// POST /api/v1/deals/:id/vote — cast, swap or retract a vote; the response
/// carries the deal's new counters and the caller's resulting vote.
pub(in crate::api) async fn cast_vote(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(deal_id): Path<Uuid>,
    Json(body): Json<VoteRequest>,
) -> Result<Json<ApiResponse<VoteView>>, ApiError> {
    let rid = &req_id.0;
    let user = require_identity(&headers, rid)?;

    let outcome = chollo_db::cast_vote(&state.pool, &user.id, deal_id, body.direction)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: VoteView {
            vote: outcome.vote,
            upvotes: outcome.upvotes,
            downvotes: outcome.downvotes,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/deals/:id/report — flag the deal as unavailable.
pub(in crate::api) async fn report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(deal_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReportView>>, ApiError> {
    set_report(state, req_id, headers, deal_id, true).await
}

/// DELETE /api/v1/deals/:id/report — withdraw the caller's report.
pub(in crate::api) async fn unreport(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(deal_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReportView>>, ApiError> {
    set_report(state, req_id, headers, deal_id, false).await
}

async fn set_report(
    state: AppState,
    req_id: RequestId,
    headers: HeaderMap,
    deal_id: Uuid,
    reported: bool,
) -> Result<Json<ApiResponse<ReportView>>, ApiError> {
    let rid = &req_id.0;
    let user = require_identity(&headers, rid)?;

    let outcome = chollo_db::set_report(&state.pool, &user.id, deal_id, reported)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ReportView {
            reported: outcome.reported,
            unavailable_reports: outcome.unavailable_reports,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/deals/:id/interaction — the caller's interaction state, with
/// empty defaults when no record exists yet.
pub(in crate::api) async fn get_state(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(deal_id): Path<Uuid>,
) -> Result<Json<ApiResponse<InteractionStateView>>, ApiError> {
    let rid = &req_id.0;
    let user = require_identity(&headers, rid)?;

    let view = match chollo_db::get_interaction(&state.pool, &user.id, deal_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
    {
        Some(row) => InteractionStateView {
            vote: row
                .vote_direction()
                .map_err(|e| map_db_error(rid.clone(), &e))?,
            reported_unavailable: row.reported_unavailable,
        },
        None => InteractionStateView {
            vote: None,
            reported_unavailable: false,
        },
    };

    Ok(Json(ApiResponse {
        data: view,
        meta: ResponseMeta::new(req_id.0),
    }))
}
