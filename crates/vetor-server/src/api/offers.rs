use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;

use crate::api::{ApiError, AppState};
use crate::cache::OfferCache;
use crate::middleware::RequestId;

/// Hard ceiling on ids per request; the marketplace multiget endpoint
/// rejects larger batches anyway.
const MAX_IDS: usize = 50;

/// Downstream CDN caching directive. The page layer revalidates hourly
/// and may serve stale for a day while the origin refreshes.
const CACHE_CONTROL_VALUE: &str = "public, s-maxage=3600, stale-while-revalidate=86400";

#[derive(Debug, Deserialize)]
pub(super) struct OffersQuery {
    ids: Option<String>,
}

/// `GET /api/v1/offers?ids=MLB1,MLB2`
///
/// Returns the resolved offer list as a JSON array. The response is always
/// 200 for a well-formed request: upstream failures degrade to the catalog
/// fallback inside the service, never to a 5xx here.
pub(super) async fn get_offers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<OffersQuery>,
) -> Response {
    let Some(raw) = query.ids else {
        return ApiError::new(
            req_id.0,
            "bad_request",
            "missing required query parameter 'ids'",
        )
        .into_response();
    };

    let ids: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
        .collect();

    if ids.is_empty() {
        return ApiError::new(req_id.0, "bad_request", "'ids' contains no usable item ids")
            .into_response();
    }
    if ids.len() > MAX_IDS {
        return ApiError::new(
            req_id.0,
            "bad_request",
            format!("too many ids: {} (limit {MAX_IDS})", ids.len()),
        )
        .into_response();
    }

    let key = OfferCache::key_for(&ids);
    let offers = if let Some(hit) = state.cache.get(&key).await {
        tracing::debug!(key = %key, "offer cache hit");
        hit
    } else {
        let offers = state.service.resolve(&ids).await;
        state.cache.insert(key, &ids, offers.clone()).await;
        offers
    };

    (
        [(header::CACHE_CONTROL, CACHE_CONTROL_VALUE)],
        Json(offers),
    )
        .into_response()
}
