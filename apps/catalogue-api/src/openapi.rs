//! OpenAPI documentation configuration

use utoipa::openapi::OpenApi as OpenApiDoc;
use utoipa::{Modify, OpenApi};

/// Combined OpenAPI documentation for Catalogue API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalogue API",
        version = "0.1.0",
        description = "Read-only sock catalogue: listing, counting, lookup, tags and health",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    modifiers(&CatalogueRoutes)
)]
pub struct ApiDoc;

/// Catalogue routes are mounted at the root, so their paths merge in as-is.
struct CatalogueRoutes;

impl Modify for CatalogueRoutes {
    fn modify(&self, openapi: &mut OpenApiDoc) {
        openapi.merge(domain_catalogue::ApiDoc::openapi());
    }
}
