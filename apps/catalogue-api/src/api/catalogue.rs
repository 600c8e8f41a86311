//! Catalogue API routes

use axum::Router;
use domain_catalogue::handlers::{self, HandlerSettings};
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::state::AppState;

/// Create catalogue router, including the static image files
pub fn router(state: &AppState) -> Router {
    let settings = HandlerSettings {
        request_timeout: state.config.request_timeout,
    };

    handlers::router(Arc::clone(&state.service), settings)
        .nest_service("/catalogue/images", ServeDir::new(&state.config.images_path))
}

/// Number of files in the images directory, for the startup log
pub fn count_images(state: &AppState) -> usize {
    std::fs::read_dir(&state.config.images_path)
        .map(|entries| entries.filter_map(Result::ok).count())
        .unwrap_or(0)
}
