use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Schema, Statement,
};
use tracing::info;

use crate::{
    context::CallContext,
    entity,
    error::StoreResult,
    models::Sock,
    repository::{validate_seed, SockStore},
};

/// PostgreSQL-backed sock store.
///
/// Tags live in a JSONB array column; the intersection filter is a single
/// `@>` containment test. Store order is ascending by id.
pub struct PgSockStore {
    db: DatabaseConnection,
}

impl PgSockStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create the socks table and its tag index when missing.
    pub async fn init_schema(&self) -> StoreResult<()> {
        let backend = self.db.get_database_backend();
        let schema = Schema::new(backend);
        let mut create = schema.create_table_from_entity(entity::Entity);
        create.if_not_exists();
        self.db.execute_raw(backend.build(&create)).await?;

        self.db
            .execute_raw(Statement::from_string(
                DatabaseBackend::Postgres,
                "CREATE INDEX IF NOT EXISTS socks_tags_gin ON socks USING GIN (tags)".to_owned(),
            ))
            .await?;

        info!("Socks schema ready");
        Ok(())
    }

    /// Insert `socks` only when the table is empty. Returns rows inserted.
    pub async fn seed_if_empty(&self, socks: &[Sock]) -> StoreResult<u64> {
        validate_seed(socks)?;

        let existing = entity::Entity::find().count(&self.db).await?;
        if existing > 0 || socks.is_empty() {
            return Ok(0);
        }

        let models: Vec<entity::ActiveModel> = socks.iter().map(Into::into).collect();
        entity::Entity::insert_many(models).exec(&self.db).await?;

        info!(socks = socks.len(), "Seeded socks table");
        Ok(socks.len() as u64)
    }
}

#[async_trait]
impl SockStore for PgSockStore {
    async fn find_by_tags(&self, ctx: &CallContext, tags: &[String]) -> StoreResult<Vec<Sock>> {
        ctx.check()?;

        let mut query = entity::Entity::find();
        if !tags.is_empty() {
            query = query.filter(Expr::cust_with_values(
                "tags @> $1::jsonb",
                [serde_json::json!(tags)],
            ));
        }

        let models = query
            .order_by_asc(entity::Column::Id)
            .all(&self.db)
            .await?;

        models
            .into_iter()
            .map(|m| Sock::try_from(m).map_err(Into::into))
            .collect()
    }

    async fn find_by_id(&self, ctx: &CallContext, id: &str) -> StoreResult<Option<Sock>> {
        ctx.check()?;

        let model = entity::Entity::find_by_id(id.to_owned())
            .one(&self.db)
            .await?;

        Ok(model.map(Sock::try_from).transpose()?)
    }

    async fn all_tags(&self, ctx: &CallContext) -> StoreResult<Vec<String>> {
        ctx.check()?;

        let stmt = Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT DISTINCT t.tag AS tag \
             FROM socks, jsonb_array_elements_text(socks.tags) AS t(tag) \
             ORDER BY tag"
                .to_owned(),
        );

        let rows = self.db.query_all_raw(stmt).await?;
        rows.iter()
            .map(|row| row.try_get::<String>("", "tag").map_err(Into::into))
            .collect()
    }

    async fn ping(&self, ctx: &CallContext) -> StoreResult<()> {
        ctx.check()?;
        database::postgres::check_health(&self.db).await?;
        Ok(())
    }
}
