//! Catalogue Domain
//!
//! Read-only lookup over a collection of socks: filtered/sorted/paginated
//! listing, counting, single-item retrieval, tag enumeration and health.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │    Handlers      │  ← HTTP endpoints (/catalogue, /tags, /health)
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐
//! │   Decorators     │  ← LoggingCatalogue, InstrumentedCatalogue
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐
//! │     Service      │  ← Tag normalisation, stable sort, pagination
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐
//! │      Store       │  ← SockStore trait (memory + PostgreSQL)
//! └──────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use domain_catalogue::{
//!     handlers::{self, HandlerSettings},
//!     CatalogueServiceImpl, LoggingCatalogue, MemorySockStore,
//! };
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemorySockStore::from_json_file("data/socks.json")?;
//! let service = CatalogueServiceImpl::new(store);
//! let logged = LoggingCatalogue::new(Arc::new(service));
//!
//! let router = handlers::router(Arc::new(logged), HandlerSettings::default());
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod health;
pub mod memory;
pub mod middleware;
pub mod models;
pub mod postgres;
pub mod query;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use context::CallContext;
pub use error::{CatalogueError, CatalogueResult, StoreError, StoreResult};
pub use handlers::ApiDoc;
pub use health::{HealthProbe, HealthReporter, ServiceProbe, StoreProbe};
pub use memory::MemorySockStore;
pub use middleware::{InstrumentedCatalogue, LoggingCatalogue};
pub use models::{HealthFact, HealthStatus, ListQuery, Sock, SortKey, SortOrder};
pub use postgres::PgSockStore;
pub use repository::SockStore;
pub use service::{CatalogueService, CatalogueServiceImpl};
