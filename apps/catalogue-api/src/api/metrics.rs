//! Prometheus scrape endpoint and HTTP metrics

use axum::{middleware, routing::get, Router};
use observability::{metrics_handler, metrics_middleware};

/// Add `/metrics` and record request metrics for every route in `router`.
pub fn instrument(router: Router) -> Router {
    router
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(metrics_middleware))
}
