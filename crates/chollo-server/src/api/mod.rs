mod deals;
mod highlights;
mod interactions;
mod stores;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chollo_core::{store::StoreSeeds, AppConfig};
use chollo_scraper::{FaviconClient, MetadataClient};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{
    enforce_rate_limit, identity_from_headers, request_id, require_bearer_auth, AuthState,
    RateLimitState, RequestId, UserIdentity,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub seeds: Arc<StoreSeeds>,
    pub metadata: Arc<MetadataClient>,
    pub favicon: Arc<FaviconClient>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(20).clamp(1, 100)
}

pub(super) fn map_db_error(request_id: String, error: &chollo_db::DbError) -> ApiError {
    if matches!(error, chollo_db::DbError::NotFound) {
        return ApiError::new(request_id, "not_found", "record not found");
    }
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal", "database query failed")
}

/// The identity asserted by the frontend, required on authenticated routes.
pub(super) fn require_identity(
    headers: &axum::http::HeaderMap,
    request_id: &str,
) -> Result<UserIdentity, ApiError> {
    identity_from_headers(headers).ok_or_else(|| {
        ApiError::new(
            request_id,
            "unauthorized",
            "missing x-user-id header on an authenticated route",
        )
    })
}

/// Parse a URL field, rejecting everything but absolute http/https URLs.
pub(super) fn parse_http_url_or_validation_error(
    request_id: &str,
    field: &str,
    value: &str,
) -> Result<reqwest::Url, ApiError> {
    let url = reqwest::Url::parse(value).map_err(|_| {
        ApiError::new(
            request_id,
            "validation_error",
            format!("'{field}' must be a valid URL, got '{value}'"),
        )
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            format!("'{field}' must use http or https"),
        ));
    }

    Ok(url)
}

fn build_cors(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static("x-user-id"),
            HeaderName::from_static("x-user-name"),
        ]);

    if allowed_origins.is_empty() {
        return layer.allow_origin(tower_http::cors::Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    layer.allow_origin(origins)
}

fn public_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/deals", get(deals::list_deals))
        .route("/api/v1/deals/{deal_id}", get(deals::get_deal))
        .route("/api/v1/deals/{deal_id}/view", post(deals::track_view))
        .route(
            "/api/v1/highlights/categories",
            get(highlights::top_categories),
        )
        .route("/api/v1/highlights/stores", get(highlights::top_stores))
        .route("/api/v1/highlights/featured", get(highlights::featured))
        .route(
            "/api/v1/highlights/most-viewed",
            get(highlights::most_viewed),
        )
        .route("/api/v1/stores", get(stores::list_stores))
        .route("/api/v1/stores/resolve", get(stores::resolve_store))
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/deals", post(deals::create_deal))
        .route(
            "/api/v1/deals/{deal_id}",
            axum::routing::patch(deals::update_deal).delete(deals::delete_deal),
        )
        .route("/api/v1/deals/{deal_id}/vote", post(interactions::cast_vote))
        .route(
            "/api/v1/deals/{deal_id}/report",
            post(interactions::report).delete(interactions::unreport),
        )
        .route(
            "/api/v1/deals/{deal_id}/interaction",
            get(interactions::get_state),
        )
        .route("/api/v1/scrape", get(stores::scrape_preview))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let cors = build_cors(&state.config.cors_allowed_origins);

    Router::new()
        .merge(public_router())
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match chollo_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}
