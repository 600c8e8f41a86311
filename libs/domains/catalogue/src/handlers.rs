//! HTTP handlers for the Catalogue API

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use axum_helpers::errors::responses::{
    GatewayTimeoutResponse, NotFoundResponse, ServiceUnavailableResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::context::CallContext;
use crate::error::CatalogueResult;
use crate::models::{HealthFact, HealthStatus, ListQuery, Sock, SortOrder};
use crate::query::split_tags;
use crate::service::CatalogueService;

/// Page used when `page` is missing or not a number
pub const DEFAULT_PAGE: i64 = 1;

/// Page size used when `size` is missing or not a number
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// OpenAPI documentation for the Catalogue API
#[derive(OpenApi)]
#[openapi(
    paths(list_socks, count_socks, get_sock, list_tags, health),
    components(
        schemas(Sock, HealthFact, HealthStatus, CountResponse, TagsResponse, HealthResponse),
        responses(NotFoundResponse, ServiceUnavailableResponse, GatewayTimeoutResponse)
    ),
    tags(
        (name = "Catalogue", description = "Read-only sock catalogue")
    )
)]
pub struct ApiDoc;

/// Per-router request settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerSettings {
    /// Deadline applied to every call. `None` disables it.
    pub request_timeout: Option<Duration>,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(10)),
        }
    }
}

struct CatalogueState<S: ?Sized> {
    service: Arc<S>,
    settings: HandlerSettings,
}

impl<S: ?Sized> Clone for CatalogueState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            settings: self.settings,
        }
    }
}

impl<S: ?Sized> CatalogueState<S> {
    fn context(&self) -> CallContext {
        CallContext::from_timeout(self.settings.request_timeout)
    }
}

/// Create the catalogue router with all endpoints
pub fn router<S>(service: Arc<S>, settings: HandlerSettings) -> Router
where
    S: CatalogueService + ?Sized + 'static,
{
    Router::new()
        .route("/catalogue", get(list_socks::<S>))
        .route("/catalogue/size", get(count_socks::<S>))
        .route("/catalogue/{id}", get(get_sock::<S>))
        .route("/tags", get(list_tags::<S>))
        .route("/health", get(health::<S>))
        .with_state(CatalogueState { service, settings })
}

/// Raw query pairs in arrival order. Repeated keys are allowed here and
/// resolved by the params types, so `?tags=a&tags=b` is never a 400.
type QueryPairs = Vec<(String, String)>;

/// First value for `key`, if any.
fn first<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Listing parameters. Values are taken as raw strings so malformed numbers
/// fall back to defaults instead of rejecting the request. When a key repeats,
/// the first occurrence wins.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Comma separated tags; a sock must carry all of them
    #[param(example = "blue,formal")]
    pub tags: Option<String>,
    /// Sort key (`id`, `name`, `price`, `count`, `tags`); prefix with `-` for descending
    #[param(example = "-price")]
    pub order: Option<String>,
    /// 1-based page number
    #[param(example = "1")]
    pub page: Option<String>,
    /// Page size; 0 or less returns every match
    #[param(example = "10")]
    pub size: Option<String>,
}

impl ListParams {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let field = |key: &str| first(pairs, key).map(str::to_string);
        Self {
            tags: field("tags"),
            order: field("order"),
            page: field("page"),
            size: field("size"),
        }
    }

    pub fn into_query(self) -> ListQuery {
        let tags = self.tags.as_deref().map(split_tags).unwrap_or_default();
        let order = SortOrder::parse_lenient(self.order.as_deref().unwrap_or_default());
        let page = parse_or(self.page.as_deref(), DEFAULT_PAGE);
        let size = parse_or(self.size.as_deref(), DEFAULT_PAGE_SIZE);

        ListQuery::new(tags).order(order).page(page, size)
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CountParams {
    /// Comma separated tags; a sock must carry all of them
    pub tags: Option<String>,
}

impl CountParams {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            tags: first(pairs, "tags").map(str::to_string),
        }
    }

    pub fn tags(&self) -> Vec<String> {
        self.tags.as_deref().map(split_tags).unwrap_or_default()
    }
}

fn parse_or(raw: Option<&str>, default: i64) -> i64 {
    match raw.map(str::trim) {
        None | Some("") => default,
        Some(value) => value.parse().unwrap_or_else(|_| {
            tracing::debug!(value, default, "Ignoring malformed paging parameter");
            default
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CountResponse {
    /// Number of socks matching the tag filter
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TagsResponse {
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub health: Vec<HealthFact>,
}

/// List socks with tag filter, ordering and pagination
#[utoipa::path(
    get,
    path = "/catalogue",
    tag = "Catalogue",
    params(ListParams),
    responses(
        (status = 200, description = "One page of matching socks", body = Vec<Sock>),
        (status = 503, response = ServiceUnavailableResponse),
        (status = 504, response = GatewayTimeoutResponse)
    )
)]
async fn list_socks<S>(
    State(state): State<CatalogueState<S>>,
    Query(pairs): Query<QueryPairs>,
) -> CatalogueResult<Json<Vec<Sock>>>
where
    S: CatalogueService + ?Sized + 'static,
{
    let query = ListParams::from_pairs(&pairs).into_query();
    let ctx = state.context();
    let _guard = ctx.cancel_on_drop();
    let socks = state.service.list(&ctx, query).await?;
    Ok(Json(socks))
}

/// Count socks carrying every requested tag
#[utoipa::path(
    get,
    path = "/catalogue/size",
    tag = "Catalogue",
    params(CountParams),
    responses(
        (status = 200, description = "Number of matching socks", body = CountResponse),
        (status = 503, response = ServiceUnavailableResponse),
        (status = 504, response = GatewayTimeoutResponse)
    )
)]
async fn count_socks<S>(
    State(state): State<CatalogueState<S>>,
    Query(pairs): Query<QueryPairs>,
) -> CatalogueResult<Json<CountResponse>>
where
    S: CatalogueService + ?Sized + 'static,
{
    let tags = CountParams::from_pairs(&pairs).tags();
    let ctx = state.context();
    let _guard = ctx.cancel_on_drop();
    let size = state.service.count(&ctx, &tags).await?;
    Ok(Json(CountResponse { size }))
}

/// Get a sock by ID
#[utoipa::path(
    get,
    path = "/catalogue/{id}",
    tag = "Catalogue",
    params(
        ("id" = String, Path, description = "Sock identifier")
    ),
    responses(
        (status = 200, description = "Sock found", body = Sock),
        (status = 404, response = NotFoundResponse),
        (status = 503, response = ServiceUnavailableResponse),
        (status = 504, response = GatewayTimeoutResponse)
    )
)]
async fn get_sock<S>(
    State(state): State<CatalogueState<S>>,
    Path(id): Path<String>,
) -> CatalogueResult<Json<Sock>>
where
    S: CatalogueService + ?Sized + 'static,
{
    let ctx = state.context();
    let _guard = ctx.cancel_on_drop();
    let sock = state.service.get(&ctx, &id).await?;
    Ok(Json(sock))
}

/// List every distinct tag, sorted
#[utoipa::path(
    get,
    path = "/tags",
    tag = "Catalogue",
    responses(
        (status = 200, description = "All tags in use", body = TagsResponse),
        (status = 503, response = ServiceUnavailableResponse),
        (status = 504, response = GatewayTimeoutResponse)
    )
)]
async fn list_tags<S>(State(state): State<CatalogueState<S>>) -> CatalogueResult<Json<TagsResponse>>
where
    S: CatalogueService + ?Sized + 'static,
{
    let ctx = state.context();
    let _guard = ctx.cancel_on_drop();
    let tags = state.service.tags(&ctx).await?;
    Ok(Json(TagsResponse { tags }))
}

/// Report the health of the service and its store.
///
/// Always answers 200; unhealthy dependencies show up in the body.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Catalogue",
    responses(
        (status = 200, description = "One fact per probed dependency", body = HealthResponse)
    )
)]
async fn health<S>(State(state): State<CatalogueState<S>>) -> Json<HealthResponse>
where
    S: CatalogueService + ?Sized + 'static,
{
    let ctx = state.context();
    let _guard = ctx.cancel_on_drop();
    let health = state.service.health(&ctx).await;
    Json(HealthResponse { health })
}
