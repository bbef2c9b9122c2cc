//! Store directory and scrape-prefill handlers.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Extension, Json,
};
use chollo_core::{
    category::guess_category,
    domain::canonical_domain,
    store::{preview_store, Store},
};
use chollo_db::StoreRow;
use chollo_scraper::extract::first_price_in;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{
    map_db_error, parse_http_url_or_validation_error, require_identity, ApiError, ApiResponse,
    AppState, ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct UrlQuery {
    pub url: String,
}

/// GET /api/v1/stores — the directory, sentinel excluded.
pub(in crate::api) async fn list_stores(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<Store>>>, ApiError> {
    let rid = &req_id.0;

    let rows = chollo_db::list_stores(&state.pool)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(StoreRow::into_store).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/stores/resolve?url= — synthesis preview for a purchase link,
/// nothing persisted. Unparseable links preview as the unknown sentinel.
pub(in crate::api) async fn resolve_store(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<ApiResponse<Store>>, ApiError> {
    let domain = canonical_domain(&query.url);
    let favicon = if domain.is_empty() {
        None
    } else {
        state.favicon.resolve(&domain).await
    };

    Ok(Json(ApiResponse {
        data: preview_store(&state.seeds, &query.url, favicon.as_deref()),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/scrape?url= — metadata proxy for form pre-fill, with a price
/// extracted from the scraped text and a guessed category. A failed scrape
/// is an empty object; the form simply stays blank.
pub(in crate::api) async fn scrape_preview(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Query(query): Query<UrlQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let rid = &req_id.0;
    require_identity(&headers, rid)?;
    parse_http_url_or_validation_error(rid, "url", &query.url)?;

    let data = match state.metadata.fetch(&query.url).await {
        Ok(meta) => {
            let text = format!(
                "{} {}",
                meta.title.as_deref().unwrap_or_default(),
                meta.description.as_deref().unwrap_or_default()
            );
            serde_json::json!({
                "title": meta.title,
                "description": meta.description,
                "publisher": meta.publisher,
                "image_url": meta.image_url,
                "logo_url": meta.logo_url,
                "parsed_price": first_price_in(&text),
                "suggested_category": guess_category(&text).as_str(),
            })
        }
        Err(e) => {
            tracing::debug!(url = %query.url, error = %e, "scrape failed; returning empty prefill");
            serde_json::json!({})
        }
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
