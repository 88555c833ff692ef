//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::health::{health, ready};
use crate::handlers::upload::upload_video;
use crate::handlers::videos::{
    get_sprite, get_video_metadata, get_video_status, list_videos, stream_video,
};
use crate::middleware::cors_layer;
use crate::state::AppState;

/// Headroom for multipart boundaries and non-file fields on top of the
/// configured file size limit.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let video_routes = Router::new()
        .route("/videos", get(list_videos))
        .route("/videos/:video_id/status", get(get_video_status))
        .route("/videos/:video_id/metadata", get(get_video_metadata))
        .route("/videos/:video_id/stream", get(stream_video))
        .route("/videos/:video_id/sprite/:sprite_index", get(get_sprite));

    let body_limit = state.config.max_upload_size + MULTIPART_OVERHEAD;

    Router::new()
        .route("/upload", post(upload_video))
        .nest("/api", video_routes)
        .route("/health", get(health))
        .route("/ready", get(ready))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
