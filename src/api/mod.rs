pub mod dto;
pub mod handlers;

use axum::{routing::get, Router};
use tower_http::{services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::feed_cache::FeedCache;
use handlers::ApiDoc;

/// Build the HTTP surface. Requests that match no API route fall through to
/// the prebuilt UI in `static_dir`, when one is configured.
pub fn router(cache: FeedCache, static_dir: Option<&str>) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/api/feeds", get(handlers::get_feeds))
        .with_state(cache)
        .split_for_parts();

    let router = router
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        );

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}
