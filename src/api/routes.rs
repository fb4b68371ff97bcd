use super::handlers::*;
use crate::ports::OrderRepositoryPort;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub fn create_router<R: OrderRepositoryPort + ?Sized + 'static>(state: AppState<R>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/orders/:order_uid", get(get_order::<R>))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
