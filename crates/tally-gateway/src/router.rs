//! Axum router wiring.
//!
//! - `/v1/counters...` : REST counter operations
//! - `/v1/ws`          : WebSocket command channel
//! - `/healthz`, `/readyz`, `/metrics` : operational endpoints

use axum::{
    routing::{get, post},
    Router,
};

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    use transport::http;

    Router::new()
        .route("/v1/counters", post(http::create_counter).get(http::list_counters))
        .route(
            "/v1/counters/:id",
            get(http::get_counter)
                .put(http::set_counter)
                .delete(http::destroy_counter),
        )
        .route("/v1/counters/:id/increment", post(http::increment_counter))
        .route("/v1/counters/:id/decrement", post(http::decrement_counter))
        .route("/v1/ws", get(transport::ws::ws_upgrade))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .with_state(state)
}
