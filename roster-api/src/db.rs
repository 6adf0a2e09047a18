//! PostgreSQL Store Gateway
//!
//! [`PgEntityStore`] implements [`EntityStore`] over a `deadpool-postgres`
//! connection pool. The pool is created once at startup and shared by the
//! refresher and every request handler.
//!
//! Entities live in a single table:
//!
//! ```sql
//! CREATE TABLE entity (
//!     id    UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     title TEXT NOT NULL
//! );
//! ```

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, PoolError, RecyclingMethod, Runtime};
use roster_core::{Entity, EntityId, NewEntity, Snapshot, StoreError, StoreResult};
use roster_storage::EntityStore;
use tokio_postgres::{NoTls, Row};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::error::{ApiError, ApiResult};

const CREATE_COLLECTION_SQL: &str = "CREATE TABLE IF NOT EXISTS entity (\
     id UUID PRIMARY KEY DEFAULT gen_random_uuid(), \
     title TEXT NOT NULL)";

const FETCH_ALL_SQL: &str = "SELECT id, title FROM entity";

const INSERT_ONE_SQL: &str = "INSERT INTO entity (title) VALUES ($1) RETURNING id, title";

const FIND_AND_REPLACE_SQL: &str =
    "UPDATE entity SET title = $2 WHERE id = $1 RETURNING id, title";

// ============================================================================
// STORE
// ============================================================================

/// PostgreSQL-backed entity store.
#[derive(Clone)]
pub struct PgEntityStore {
    pool: Pool,
}

impl PgEntityStore {
    /// Create a new store over an existing pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a connection pool from the service configuration.
    ///
    /// No connection is opened here; see [`connect`](Self::connect).
    pub fn create_pool(config: &ServiceConfig) -> ApiResult<Pool> {
        let manager = Manager::from_config(
            config.store.clone(),
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        Pool::builder(manager)
            .max_size(config.pool_size)
            .runtime(Runtime::Tokio1)
            .wait_timeout(Some(config.store_timeout))
            .create_timeout(Some(config.connect_timeout))
            .build()
            .map_err(|e| ApiError::internal_error(format!("Failed to create pool: {}", e)))
    }

    /// Build the pool, prove the store is reachable and make sure the entity
    /// table exists.
    ///
    /// Fails if the store cannot be reached within the connect timeout; the
    /// service must not start without a working connection.
    pub async fn connect(config: &ServiceConfig) -> ApiResult<Self> {
        let store = Self::new(Self::create_pool(config)?);

        tokio::time::timeout(config.connect_timeout, store.ensure_collection())
            .await
            .map_err(|_| StoreError::TimedOut {
                operation: "connect",
                after: config.connect_timeout,
            })??;

        tracing::info!(
            pool_max_size = config.pool_size,
            "Connected to entity store"
        );
        Ok(store)
    }

    /// Create the entity table if it does not exist yet.
    pub async fn ensure_collection(&self) -> StoreResult<()> {
        let conn = self.get_conn().await?;
        conn.batch_execute(CREATE_COLLECTION_SQL)
            .await
            .map_err(query_error)
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> StoreResult<Object> {
        self.pool.get().await.map_err(pool_error)
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn fetch_all(&self) -> StoreResult<Snapshot> {
        let conn = self.get_conn().await?;
        let rows = conn.query(FETCH_ALL_SQL, &[]).await.map_err(query_error)?;

        let entities = rows
            .iter()
            .map(entity_from_row)
            .collect::<StoreResult<Vec<_>>>()?;

        tracing::debug!(count = entities.len(), "Fetched all entities");
        Ok(Snapshot::new(entities))
    }

    async fn insert_one(&self, candidate: NewEntity) -> StoreResult<Entity> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_one(INSERT_ONE_SQL, &[&candidate.title])
            .await
            .map_err(query_error)?;

        let entity = entity_from_row(&row)?;
        tracing::debug!(entity_id = %entity.id, "Inserted entity");
        Ok(entity)
    }

    async fn find_and_replace_one(&self, id: EntityId, title: String) -> StoreResult<Entity> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(FIND_AND_REPLACE_SQL, &[&id, &title])
            .await
            .map_err(query_error)?
            .ok_or(StoreError::NotFound { id })?;

        let entity = entity_from_row(&row)?;
        tracing::debug!(entity_id = %entity.id, "Replaced entity title");
        Ok(entity)
    }
}

// ============================================================================
// ROW AND ERROR MAPPING
// ============================================================================

fn entity_from_row(row: &Row) -> StoreResult<Entity> {
    let id: Uuid = row
        .try_get("id")
        .map_err(|e| StoreError::backend(format!("Failed to decode entity id: {}", e)))?;
    let title: String = row
        .try_get("title")
        .map_err(|e| StoreError::backend(format!("Failed to decode entity title: {}", e)))?;
    Ok(Entity::new(id, title))
}

/// Errors reported by the server are backend errors; everything else means
/// the connection itself is gone.
fn query_error(err: tokio_postgres::Error) -> StoreError {
    if err.as_db_error().is_some() {
        StoreError::backend(err.to_string())
    } else {
        StoreError::unavailable(err.to_string())
    }
}

fn pool_error(err: PoolError) -> StoreError {
    match err {
        PoolError::Timeout(kind) => {
            StoreError::unavailable(format!("Timed out acquiring connection ({:?})", kind))
        }
        PoolError::Closed => StoreError::unavailable("Connection pool is closed"),
        PoolError::Backend(e) => StoreError::unavailable(format!("Connection failed: {}", e)),
        other => StoreError::unavailable(other.to_string()),
    }
}
