//! Highlight surfaces: the ranked groups and carousels the front page shows.
//!
//! Each handler loads the relevant window of deals and hands the ranking to
//! the pure functions in `chollo_core::ranking`; nothing here orders rows
//! itself.

use axum::{extract::State, Extension, Json};
use chollo_core::{ranking, Deal};
use chollo_db::{DealListFilters, DealRow, DealSort};
use chrono::{Duration, Utc};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// Upper bound on rows pulled for in-memory ranking. Windows are short, so
/// this comfortably covers them.
const HIGHLIGHT_SCAN_LIMIT: i64 = 500;

#[derive(Debug, Serialize)]
pub(in crate::api) struct GroupView {
    pub label: String,
    pub final_score: f64,
    pub deal_count: usize,
    pub total_vote_score: i64,
    pub average_discount: Option<f64>,
    pub deals: Vec<Deal>,
}

impl GroupView {
    fn from_group(group: &ranking::DealGroup<'_>) -> Self {
        Self {
            label: group.label.clone(),
            final_score: group.final_score,
            deal_count: group.deal_count,
            total_vote_score: group.total_vote_score,
            average_discount: group.average_discount,
            deals: group.deals.iter().map(|&d| d.clone()).collect(),
        }
    }
}

async fn window_deals(
    state: &AppState,
    rid: &str,
    days: i64,
    sort: DealSort,
) -> Result<Vec<Deal>, ApiError> {
    let filters = DealListFilters {
        created_since: Some(Utc::now() - Duration::days(days)),
        sort,
        limit: HIGHLIGHT_SCAN_LIMIT,
        ..DealListFilters::default()
    };

    let rows = chollo_db::list_deals(&state.pool, filters)
        .await
        .map_err(|e| map_db_error(rid.to_owned(), &e))?;

    Ok(rows.into_iter().map(DealRow::into_deal).collect())
}

/// GET /api/v1/highlights/categories — top category groups over the recent
/// window.
pub(in crate::api) async fn top_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<GroupView>>>, ApiError> {
    let rid = &req_id.0;
    let deals = window_deals(&state, rid, state.config.recent_window_days, DealSort::Created).await?;
    let groups = ranking::top_category_groups(&deals);

    Ok(Json(ApiResponse {
        data: groups.iter().map(GroupView::from_group).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/highlights/stores — top store groups with their stats; the
/// unknown sentinel never appears.
pub(in crate::api) async fn top_stores(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<GroupView>>>, ApiError> {
    let rid = &req_id.0;
    let deals = window_deals(&state, rid, state.config.recent_window_days, DealSort::Created).await?;
    let groups = ranking::top_store_groups(&deals);

    Ok(Json(ApiResponse {
        data: groups.iter().map(GroupView::from_group).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/highlights/featured — the trailing week's best-voted deals.
pub(in crate::api) async fn featured(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<Deal>>>, ApiError> {
    let rid = &req_id.0;
    let deals = window_deals(&state, rid, ranking::FEATURED_WINDOW_DAYS, DealSort::Created).await?;
    let featured: Vec<Deal> = ranking::featured_deals(&deals, Utc::now())
        .into_iter()
        .cloned()
        .collect();

    Ok(Json(ApiResponse {
        data: featured,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/highlights/most-viewed — two months of deals with at least
/// one view, by view count.
pub(in crate::api) async fn most_viewed(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<Deal>>>, ApiError> {
    let rid = &req_id.0;
    let deals = window_deals(&state, rid, ranking::MOST_VIEWED_WINDOW_DAYS, DealSort::Views).await?;
    let viewed: Vec<Deal> = ranking::most_viewed_deals(&deals, Utc::now())
        .into_iter()
        .cloned()
        .collect();

    Ok(Json(ApiResponse {
        data: viewed,
        meta: ResponseMeta::new(req_id.0),
    }))
}
