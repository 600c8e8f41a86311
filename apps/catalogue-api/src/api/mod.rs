//! API routes module

pub mod catalogue;
pub mod metrics;

use axum::Router;

use crate::state::AppState;

/// Create all API routes
pub fn routes(state: &AppState) -> Router {
    let router = catalogue::router(state);

    if state.config.metrics_enabled {
        metrics::instrument(router)
    } else {
        router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Environment, StoreBackend};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use core_config::{app_info, server::ServerConfig};
    use http_body_util::BodyExt;
    use std::path::PathBuf;
    use std::time::Duration;
    use tower::ServiceExt;

    fn config(metrics_enabled: bool) -> Config {
        Config {
            app: app_info!(),
            server: ServerConfig::default(),
            environment: Environment::Development,
            store: StoreBackend::Memory,
            postgres: None,
            seed_file: None,
            images_path: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/images")),
            request_timeout: Some(Duration::from_secs(5)),
            metrics_enabled,
            cors_origins: None,
        }
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_catalogue_routes_served_from_bundled_seed() {
        let state = AppState::build(config(false)).await.unwrap();
        let router = routes(&state);

        let (status, body) = get(router.clone(), "/catalogue/size").await;
        assert_eq!(status, StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["size"], 9);

        let (status, body) = get(router, "/catalogue?tags=brown,green&order=price").await;
        assert_eq!(status, StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let names: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["Classic", "Cat socks"]);
    }

    #[tokio::test]
    async fn test_images_are_served() {
        let state = AppState::build(config(false)).await.unwrap();
        let router = routes(&state);

        let (status, body) = get(router.clone(), "/catalogue/images/placeholder.svg").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with(b"<svg"));

        let (status, _) = get(router, "/catalogue/images/missing.jpg").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_metrics_route_only_when_enabled() {
        let state = AppState::build(config(false)).await.unwrap();
        let (status, _) = get(routes(&state), "/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        observability::init_metrics().unwrap();
        let state = AppState::build(config(true)).await.unwrap();
        let router = routes(&state);

        let (status, _) = get(router.clone(), "/catalogue/size").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = get(router.clone(), "/health").await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = get(router, "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        let body = String::from_utf8(body).unwrap();
        assert!(!body.contains("not initialized"));
        for line in [
            "# HELP catalogue_operations_total",
            r#"catalogue_operations_total{method="count",outcome="ok"} 1"#,
            r#"catalogue_operation_duration_seconds_count{method="count"} 1"#,
            r#"catalogue_dependency_up{service="catalogue-db"} 1"#,
            "catalogue_socks_total 9",
            r#"http_requests_total{method="GET",path="/catalogue/size",status="200",status_class="2xx"} 1"#,
        ] {
            assert!(body.contains(line), "missing `{}` in:\n{}", line, body);
        }
    }
}
