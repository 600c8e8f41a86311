use axum::http::{header, HeaderValue, Method};
use core_config::Environment;
use std::io;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

/// Creates a CORS layer for a read-only API.
///
/// Allows GET, HEAD and OPTIONS from the given origins, caches preflight
/// responses for an hour and does not allow credentials.
pub fn create_cors_layer(allowed_origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

/// Creates a permissive CORS layer allowing any origin.
///
/// Development only; [`cors_layer_from_origins`] refuses it in production.
pub fn create_permissive_cors_layer() -> CorsLayer {
    CorsLayer::permissive()
}

/// Build a CORS layer from a comma-separated origin list.
///
/// `None` yields the permissive layer in development and an `InvalidInput`
/// error in production. A list with no valid entries is also `InvalidInput`.
pub fn cors_layer_from_origins(
    origins: Option<&str>,
    environment: &Environment,
) -> io::Result<CorsLayer> {
    let Some(raw) = origins else {
        if environment.is_production() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "CORS_ALLOWED_ORIGIN must be set in production",
            ));
        }
        warn!("CORS_ALLOWED_ORIGIN not set, allowing any origin in development");
        return Ok(create_permissive_cors_layer());
    };

    let allowed = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid CORS_ALLOWED_ORIGIN value: {}", e),
            )
        })?;

    if allowed.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "CORS_ALLOWED_ORIGIN cannot be empty",
        ));
    }

    info!("CORS configured with allowed origins: {}", raw);
    Ok(create_cors_layer(allowed))
}
