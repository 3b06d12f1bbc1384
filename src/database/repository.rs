use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::query_builder;
use crate::database::schema::Entity;
use crate::filter::{FilterDescriptor, QueryOptions, SelectQuery};

/// CRUD contract shared by every entity type.
///
/// Each call is one statement; dropping the returned future cancels it. Nothing is retried.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Persists `entity` and returns the stored row, including generated id and timestamps.
    async fn create(&self, entity: &T) -> Result<T, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<T, DatabaseError>;

    /// `None` for either argument applies no restriction of that kind.
    async fn find_all(
        &self,
        options: Option<&QueryOptions>,
        filter: Option<&FilterDescriptor>,
    ) -> Result<Vec<T>, DatabaseError>;

    /// Same filtering as [`Repository::find_all`]; projection, ordering and pagination don't apply.
    async fn count(&self, filter: Option<&FilterDescriptor>) -> Result<i64, DatabaseError>;

    async fn update(&self, entity: &T) -> Result<(), DatabaseError>;

    async fn delete(&self, id: Uuid) -> Result<(), DatabaseError>;

    /// Never reports `NotFound`.
    async fn exists(&self, id: Uuid) -> Result<bool, DatabaseError>;
}

pub struct PgRepository<T> {
    pool: PgPool,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> PgRepository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: PhantomData,
        }
    }
}

impl<T> Clone for PgRepository<T> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for PgRepository<T> {
    async fn create(&self, entity: &T) -> Result<T, DatabaseError> {
        let schema = T::schema();
        let values = query_builder::entity_values(entity)?;
        let sql = query_builder::insert_sql(schema, &values)?;
        tracing::debug!(table = schema.table(), query = %sql.query, "create");

        query_builder::fetch_optional(&self.pool, schema, &sql)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} insert returned no row", schema.table())))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<T, DatabaseError> {
        let schema = T::schema();
        let sql = SelectQuery::new(schema).with_primary_key(id.to_string()).to_sql();

        query_builder::fetch_optional(&self.pool, schema, &sql)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {} not found", schema.table(), id)))
    }

    async fn find_all(
        &self,
        options: Option<&QueryOptions>,
        filter: Option<&FilterDescriptor>,
    ) -> Result<Vec<T>, DatabaseError> {
        let schema = T::schema();
        let sql = SelectQuery::new(schema).apply_pagination(options).compile(filter).to_sql();
        tracing::debug!(table = schema.table(), query = %sql.query, params = sql.params.len(), "find_all");

        query_builder::fetch_rows(&self.pool, schema, &sql).await
    }

    async fn count(&self, filter: Option<&FilterDescriptor>) -> Result<i64, DatabaseError> {
        let schema = T::schema();
        let sql = SelectQuery::new(schema).compile(filter).to_count_sql();
        tracing::debug!(table = schema.table(), query = %sql.query, "count");

        query_builder::fetch_count(&self.pool, &sql).await
    }

    async fn update(&self, entity: &T) -> Result<(), DatabaseError> {
        let schema = T::schema();
        let values = query_builder::entity_values(entity)?;
        let sql = query_builder::update_sql(schema, entity.id(), &values)?;
        tracing::debug!(table = schema.table(), query = %sql.query, "update");

        match query_builder::execute(&self.pool, &sql).await? {
            0 => Err(DatabaseError::NotFound(format!("{} {} not found", schema.table(), entity.id()))),
            _ => Ok(()),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let schema = T::schema();
        let sql = query_builder::delete_sql(schema, id)?;

        match query_builder::execute(&self.pool, &sql).await? {
            0 => Err(DatabaseError::NotFound(format!("{} {} not found", schema.table(), id))),
            _ => Ok(()),
        }
    }

    async fn exists(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let sql = query_builder::exists_sql(T::schema(), id)?;
        query_builder::fetch_exists(&self.pool, &sql).await
    }
}
