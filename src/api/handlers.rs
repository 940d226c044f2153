use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use utoipa::OpenApi;

use super::dto::NoDataResponse;
use crate::{
    feed_cache::{FeedCache, FEEDS_KEY},
    thingspeak::models::{Channel, FeedEntry, FeedSnapshot},
};

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Return the most recent ThingSpeak snapshot held in memory.
///
/// A `404` here is the normal "nothing polled yet" state, not a failure.
#[utoipa::path(
    get,
    path = "/api/feeds",
    responses(
        (status = 200, description = "Latest cached feed snapshot", body = FeedSnapshot),
        (status = 404, description = "No snapshot cached yet, or it expired", body = NoDataResponse),
    ),
    tag = "feeds"
)]
pub async fn get_feeds(State(cache): State<FeedCache>) -> Response {
    match cache.get(FEEDS_KEY).await {
        Some(snapshot) => Json(&*snapshot).into_response(),
        None => (StatusCode::NOT_FOUND, Json(NoDataResponse::not_yet())).into_response(),
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(get_feeds, health),
    components(schemas(FeedSnapshot, Channel, FeedEntry, NoDataResponse)),
    tags(
        (name = "feeds",  description = "Cached ThingSpeak feed data"),
        (name = "system", description = "System endpoints"),
    ),
    info(
        title = "ThingSpeak Feed Cache API",
        version = "0.1.0",
        description = "Serves the latest ThingSpeak channel feed polled in the background"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
