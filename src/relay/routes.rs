use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use tracing::debug;

use super::sensor::SensorHub;

/// Router exposing the lid-angle event stream at `route`.
pub fn router(hub: Arc<SensorHub>, route: &str) -> Router {
    Router::new()
        .route(route, get(lid_angle))
        .with_state(hub)
}

async fn lid_angle(State(hub): State<Arc<SensorHub>>) -> impl IntoResponse {
    debug!("lid-angle client connected");
    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(hub.create_stream()),
    )
}
