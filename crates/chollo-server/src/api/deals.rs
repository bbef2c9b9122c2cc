//! Deal handlers: listing, submission, detail, owner edits and view tracking.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use chollo_core::{
    category::{guess_category, normalize_label},
    keywords::generate_search_keywords,
    price::parse_price,
    Deal, DealCategory, VoteDirection,
};
use chollo_db::{DealCursor, DealListFilters, DealPatch, DealRow, DealSort, NewDeal};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::directory::get_or_create_store;
use crate::middleware::RequestId;

use super::{
    map_db_error, normalize_limit, parse_http_url_or_validation_error, require_identity, ApiError,
    ApiResponse, AppState, ResponseMeta,
};

const MAX_TITLE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 2000;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// A submitted price: a JSON number, or free text that goes through the
/// price parser (`"$ 8.000,50"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(in crate::api) enum PriceInput {
    Number(f64),
    Text(String),
}

impl PriceInput {
    fn into_decimal(self) -> Decimal {
        match self {
            PriceInput::Number(n) => Decimal::try_from(n).unwrap_or(Decimal::ZERO),
            PriceInput::Text(raw) => parse_price(&raw),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct CreateDealRequest {
    pub title: String,
    pub description: String,
    pub previous_price: Option<PriceInput>,
    pub current_price: PriceInput,
    pub discount_percentage: Option<i32>,
    pub category: Option<String>,
    pub purchase_link: String,
    pub image_url: Option<String>,
    /// Metadata the frontend already scraped for this link, echoed back so
    /// store synthesis can use the publisher/logo without a second fetch.
    pub scraped: Option<chollo_scraper::PageMetadata>,
}

// Option<Option<T>> is intentional: outer None = "not in request" (keep current),
// Some(None) = "explicitly cleared", Some(Some(v)) = "set to value" (PATCH semantics).
#[allow(clippy::option_option)]
#[derive(Debug, Deserialize)]
pub(in crate::api) struct UpdateDealRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub previous_price: Option<Option<PriceInput>>,
    pub current_price: Option<PriceInput>,
    pub category: Option<String>,
    pub purchase_link: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
}

/// Maps an absent field to `None` and an explicit JSON `null` to `Some(None)`,
/// so the PATCH semantics documented on [`UpdateDealRequest`] hold.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct ListDealsQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub created_by: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(in crate::api) struct DealPage {
    pub deals: Vec<Deal>,
    pub next_cursor: Option<String>,
}

/// A deal plus the caller's interaction state, when the caller identified
/// themselves.
#[derive(Debug, Serialize)]
pub(in crate::api) struct DealDetail {
    pub deal: Deal,
    pub interaction: Option<InteractionView>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct InteractionView {
    pub vote: Option<VoteDirection>,
    pub reported_unavailable: bool,
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn validate_title(req_id: &str, title: &str) -> Result<String, ApiError> {
    let title = title.trim();
    if title.is_empty() || title.len() > MAX_TITLE_LEN {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            format!("title must be 1–{MAX_TITLE_LEN} characters"),
        ));
    }
    Ok(title.to_owned())
}

fn validate_description(req_id: &str, description: &str) -> Result<String, ApiError> {
    let description = description.trim();
    if description.is_empty() || description.len() > MAX_DESCRIPTION_LEN {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            format!("description must be 1–{MAX_DESCRIPTION_LEN} characters"),
        ));
    }
    Ok(description.to_owned())
}

/// Accepts a submitted category label, folding legacy spellings into the
/// canonical set.
fn validate_category(req_id: &str, label: &str) -> Result<DealCategory, ApiError> {
    normalize_label(label).parse::<DealCategory>().map_err(|_| {
        ApiError::new(
            req_id,
            "validation_error",
            format!("unknown category '{label}'"),
        )
    })
}

/// The free-text parser never yields a negative amount, but a JSON number
/// can carry one; reject it before it trips the database check.
fn validate_current_price(req_id: &str, input: PriceInput) -> Result<Decimal, ApiError> {
    let price = input.into_decimal();
    if price < Decimal::ZERO {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "current_price must not be negative",
        ));
    }
    Ok(price)
}

fn validate_discount(req_id: &str, value: i32) -> Result<i32, ApiError> {
    if (0..=100).contains(&value) {
        return Ok(value);
    }
    Err(ApiError::new(
        req_id,
        "validation_error",
        format!("discount_percentage must be between 0 and 100, got {value}"),
    ))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/deals — recent deals within the rolling window, filtered,
/// keyset-paginated.
pub(in crate::api) async fn list_deals(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ListDealsQuery>,
) -> Result<Json<ApiResponse<DealPage>>, ApiError> {
    let rid = &req_id.0;

    let sort = match query.sort.as_deref() {
        None | Some("created") => DealSort::Created,
        Some("views") => DealSort::Views,
        Some(other) => {
            return Err(ApiError::new(
                rid,
                "validation_error",
                format!("sort must be 'created' or 'views', got '{other}'"),
            ));
        }
    };

    let cursor = query
        .cursor
        .as_deref()
        .map(|raw| {
            DealCursor::decode(raw)
                .ok_or_else(|| ApiError::new(rid, "validation_error", "malformed cursor"))
        })
        .transpose()?;

    let limit = normalize_limit(query.limit);
    let created_since = Utc::now() - Duration::days(state.config.recent_window_days);
    let category = query.category.as_deref().map(normalize_label);
    let search = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());

    // One extra row tells us whether another page exists.
    let filters = DealListFilters {
        created_since: Some(created_since),
        category,
        created_by: query.created_by.as_deref(),
        search,
        sort,
        limit: limit + 1,
        cursor,
    };
    let mut rows = chollo_db::list_deals(&state.pool, filters)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let page_len = usize::try_from(limit).unwrap_or(usize::MAX);
    let has_more = rows.len() > page_len;
    rows.truncate(page_len);

    let next_cursor = (has_more && sort == DealSort::Created)
        .then(|| rows.last().map(DealCursor::from_row))
        .flatten()
        .map(|c| c.encode());

    Ok(Json(ApiResponse {
        data: DealPage {
            deals: rows.into_iter().map(DealRow::into_deal).collect(),
            next_cursor,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/deals — submit a deal. Resolves the store from the purchase
/// link, parses prices, guesses the category when absent, derives the
/// discount and generates search keywords.
pub(in crate::api) async fn create_deal(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Json(body): Json<CreateDealRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Deal>>), ApiError> {
    let rid = &req_id.0;
    let user = require_identity(&headers, rid)?;

    let title = validate_title(rid, &body.title)?;
    let description = validate_description(rid, &body.description)?;
    parse_http_url_or_validation_error(rid, "purchase_link", &body.purchase_link)?;
    if let Some(ref url) = body.image_url {
        parse_http_url_or_validation_error(rid, "image_url", url)?;
    }

    let current_price = validate_current_price(rid, body.current_price)?;
    let previous_price = body
        .previous_price
        .map(PriceInput::into_decimal)
        .filter(|p| *p > Decimal::ZERO);

    let category = match body.category.as_deref() {
        Some(label) => validate_category(rid, label)?,
        None => guess_category(&format!("{title} {description}")),
    };

    let discount_percentage = match body.discount_percentage {
        Some(value) => Some(validate_discount(rid, value)?),
        None => Deal::derived_discount(previous_price, current_price),
    };

    let hints = body.scraped.as_ref().map(chollo_scraper::PageMetadata::store_hints);
    let store = get_or_create_store(&state, &body.purchase_link, hints.as_ref())
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let new = NewDeal {
        id: Uuid::new_v4(),
        search_keywords: generate_search_keywords(&title, &description, category.as_str()),
        title,
        description,
        previous_price,
        current_price,
        discount_percentage,
        category: category.as_str().to_owned(),
        purchase_link: body.purchase_link,
        image_url: body.image_url,
        created_by: user.id,
        created_by_name: user.name,
        store_id: store.id,
    };

    let row = chollo_db::create_deal(&state.pool, &new)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: row.into_deal(),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /api/v1/deals/:id — a single deal, with the caller's interaction
/// state when an `x-user-id` header is present.
pub(in crate::api) async fn get_deal(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(deal_id): Path<Uuid>,
) -> Result<Json<ApiResponse<DealDetail>>, ApiError> {
    let rid = &req_id.0;

    let row = chollo_db::get_deal(&state.pool, deal_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "deal not found"))?;

    let interaction = match crate::middleware::identity_from_headers(&headers) {
        Some(user) => chollo_db::get_interaction(&state.pool, &user.id, deal_id)
            .await
            .map_err(|e| map_db_error(rid.clone(), &e))?
            .map(|row| {
                Ok::<_, chollo_db::DbError>(InteractionView {
                    vote: row.vote_direction()?,
                    reported_unavailable: row.reported_unavailable,
                })
            })
            .transpose()
            .map_err(|e| map_db_error(rid.clone(), &e))?,
        None => None,
    };

    Ok(Json(ApiResponse {
        data: DealDetail {
            deal: row.into_deal(),
            interaction,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PATCH /api/v1/deals/:id — owner-only sparse edit. The store is
/// re-resolved when the purchase link changes; the discount and search
/// keywords are recomputed from the effective field values.
pub(in crate::api) async fn update_deal(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(deal_id): Path<Uuid>,
    Json(body): Json<UpdateDealRequest>,
) -> Result<Json<ApiResponse<Deal>>, ApiError> {
    let rid = &req_id.0;
    let user = require_identity(&headers, rid)?;

    let existing = chollo_db::get_deal(&state.pool, deal_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "deal not found"))?;

    if existing.created_by != user.id {
        return Err(ApiError::new(
            rid,
            "forbidden",
            "only the deal's author may edit it",
        ));
    }

    let mut patch = DealPatch::default();

    if let Some(ref title) = body.title {
        patch.title = Some(validate_title(rid, title)?);
    }
    if let Some(ref description) = body.description {
        patch.description = Some(validate_description(rid, description)?);
    }
    if let Some(ref label) = body.category {
        patch.category = Some(validate_category(rid, label)?.as_str().to_owned());
    }
    if let Some(Some(ref url)) = body.image_url {
        parse_http_url_or_validation_error(rid, "image_url", url)?;
    }
    patch.image_url = body.image_url;

    patch.current_price = body
        .current_price
        .map(|p| validate_current_price(rid, p))
        .transpose()?;
    patch.previous_price = body.previous_price.map(|opt| {
        opt.map(PriceInput::into_decimal)
            .filter(|p| *p > Decimal::ZERO)
    });

    if let Some(link) = body.purchase_link {
        parse_http_url_or_validation_error(rid, "purchase_link", &link)?;
        if link != existing.purchase_link {
            let store = get_or_create_store(&state, &link, None)
                .await
                .map_err(|e| map_db_error(rid.clone(), &e))?;
            patch.store_id = Some(store.id);
        }
        patch.purchase_link = Some(link);
    }

    // Effective values after the patch, for the recomputed fields.
    let current = patch.current_price.unwrap_or(existing.current_price);
    let previous = patch
        .previous_price
        .unwrap_or(existing.previous_price);
    patch.discount_percentage = Some(Deal::derived_discount(previous, current));

    let title = patch.title.as_deref().unwrap_or(&existing.title);
    let description = patch
        .description
        .as_deref()
        .unwrap_or(&existing.description);
    let category = patch.category.as_deref().unwrap_or(&existing.category);
    patch.search_keywords = Some(generate_search_keywords(title, description, category));

    let row = chollo_db::update_deal(&state.pool, deal_id, &patch)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "deal not found"))?;

    Ok(Json(ApiResponse {
        data: row.into_deal(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/deals/:id — owner-only hard delete; interactions cascade.
pub(in crate::api) async fn delete_deal(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(deal_id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let rid = &req_id.0;
    let user = require_identity(&headers, rid)?;

    let existing = chollo_db::get_deal(&state.pool, deal_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "deal not found"))?;

    if existing.created_by != user.id {
        return Err(ApiError::new(
            rid,
            "forbidden",
            "only the deal's author may delete it",
        ));
    }

    chollo_db::delete_deal(&state.pool, deal_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deleted": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/deals/:id/view — unauthenticated view tracking.
pub(in crate::api) async fn track_view(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(deal_id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let rid = &req_id.0;

    let views = chollo_db::increment_views(&state.pool, deal_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "deal not found"))?;

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "views": views }),
        meta: ResponseMeta::new(req_id.0),
    }))
}
