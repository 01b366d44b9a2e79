// Repository layer for database operations
// Coffees with eager-loaded flavors, flavor lookup, and the event log

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use roastery_core::error::Result as StoreResult;
use roastery_core::{
    Coffee, CoffeeDraft, CoffeeId, CoffeeRepository, Event, EventFilter, EventId,
    EventRepository, Flavor, FlavorId, FlavorRef, FlavorRepository, Pagination, StoreError,
    TransactionFactory, UnitOfWork,
};
use sqlx::postgres::{PgConnectOptions, PgConnection, PgPool, PgPoolOptions};
use tracing::{debug, instrument};

use crate::models::*;
use crate::unit_of_work::PgUnitOfWork;

const SCHEMA: &str = include_str!("../schema.sql");

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Create a bounded connection pool. A request waiting longer than
    /// `acquire_timeout` for a connection fails instead of hanging.
    pub async fn connect(
        options: PgConnectOptions,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create tables and indexes that do not exist yet
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

/// Classify a sqlx error. Unique violations, serialization failures and
/// deadlocks are conflicts between concurrent writers.
pub(crate) fn db_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if let Some("23505" | "40001" | "40P01") = db.code().as_deref() {
            return StoreError::Conflict(db.message().to_string());
        }
    }
    StoreError::Database(e.to_string())
}

// ============================================
// Flavor loading shared with PgUnitOfWork
// ============================================

/// Attach flavors to coffee rows with a single query
pub(crate) async fn hydrate_coffees(
    conn: &mut PgConnection,
    rows: Vec<CoffeeRow>,
) -> StoreResult<Vec<Coffee>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
    let flavor_rows = sqlx::query_as::<_, CoffeeFlavorRow>(
        r#"
        SELECT cf.coffee_id, f.id, f.name
        FROM coffees_flavors cf
        JOIN flavors f ON f.id = cf.flavor_id
        WHERE cf.coffee_id = ANY($1)
        ORDER BY f.id
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(db_error)?;

    let mut by_coffee: HashMap<i32, Vec<Flavor>> = HashMap::new();
    for row in flavor_rows {
        by_coffee
            .entry(row.coffee_id)
            .or_default()
            .push(Flavor::new(row.id, row.name));
    }

    Ok(rows
        .into_iter()
        .map(|row| Coffee {
            flavors: by_coffee.remove(&row.id).unwrap_or_default(),
            id: row.id,
            name: row.name,
            brand: row.brand,
            recommendations: row.recommendations,
        })
        .collect())
}

pub(crate) async fn hydrate_coffee(conn: &mut PgConnection, row: CoffeeRow) -> StoreResult<Coffee> {
    let id = row.id;
    hydrate_coffees(conn, vec![row])
        .await?
        .pop()
        .ok_or(StoreError::CoffeeNotFound(id))
}

/// Insert a flavor by name, or return the id of the existing one
async fn upsert_flavor(conn: &mut PgConnection, name: &str) -> StoreResult<FlavorId> {
    sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO flavors (name)
        VALUES ($1)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(name)
    .fetch_one(&mut *conn)
    .await
    .map_err(db_error)
}

// ============================================
// Coffees
// ============================================

#[async_trait]
impl CoffeeRepository for Database {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: CoffeeId) -> StoreResult<Option<Coffee>> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;

        let row = sqlx::query_as::<_, CoffeeRow>(
            r#"
            SELECT id, name, brand, recommendations
            FROM coffees
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error)?;

        match row {
            Some(row) => Ok(Some(hydrate_coffee(&mut conn, row).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn find(&self, page: Pagination) -> StoreResult<Vec<Coffee>> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;

        let rows = sqlx::query_as::<_, CoffeeRow>(
            r#"
            SELECT id, name, brand, recommendations
            FROM coffees
            ORDER BY id
            OFFSET $1
            LIMIT $2
            "#,
        )
        .bind(i64::from(page.offset))
        .bind(page.limit.map(i64::from))
        .fetch_all(&mut *conn)
        .await
        .map_err(db_error)?;

        hydrate_coffees(&mut conn, rows).await
    }

    #[instrument(skip(self, draft), fields(coffee_id = ?draft.id))]
    async fn save(&self, draft: CoffeeDraft) -> StoreResult<Coffee> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // Upserts lock flavor rows; taking them in name order keeps two saves
        // sharing new flavors from deadlocking each other
        let mut pending: Vec<&str> = draft
            .flavors
            .iter()
            .filter(|f| !f.is_persisted())
            .map(FlavorRef::name)
            .collect();
        pending.sort_unstable();
        pending.dedup();

        let mut pending_ids: HashMap<&str, FlavorId> = HashMap::with_capacity(pending.len());
        for name in pending {
            pending_ids.insert(name, upsert_flavor(&mut tx, name).await?);
        }

        let mut flavor_ids: Vec<i32> = Vec::with_capacity(draft.flavors.len());
        for flavor in &draft.flavors {
            let id = match flavor {
                FlavorRef::Persisted(existing) => existing.id,
                FlavorRef::Pending { name } => pending_ids[name.as_str()],
            };
            if !flavor_ids.contains(&id) {
                flavor_ids.push(id);
            }
        }

        let row = match draft.id {
            None => sqlx::query_as::<_, CoffeeRow>(
                r#"
                INSERT INTO coffees (name, brand)
                VALUES ($1, $2)
                RETURNING id, name, brand, recommendations
                "#,
            )
            .bind(&draft.name)
            .bind(&draft.brand)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error)?,
            Some(id) => sqlx::query_as::<_, CoffeeRow>(
                r#"
                UPDATE coffees
                SET name = $2, brand = $3
                WHERE id = $1
                RETURNING id, name, brand, recommendations
                "#,
            )
            .bind(id)
            .bind(&draft.name)
            .bind(&draft.brand)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?
            .ok_or(StoreError::CoffeeNotFound(id))?,
        };

        sqlx::query("DELETE FROM coffees_flavors WHERE coffee_id = $1")
            .bind(row.id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        sqlx::query(
            r#"
            INSERT INTO coffees_flavors (coffee_id, flavor_id)
            SELECT $1, UNNEST($2::int4[])
            "#,
        )
        .bind(row.id)
        .bind(&flavor_ids)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        let coffee = hydrate_coffee(&mut tx, row).await?;
        tx.commit().await.map_err(db_error)?;

        debug!(coffee_id = coffee.id, flavors = coffee.flavors.len(), "saved coffee");
        Ok(coffee)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: CoffeeId) -> StoreResult<Option<Coffee>> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let row = sqlx::query_as::<_, CoffeeRow>(
            r#"
            SELECT id, name, brand, recommendations
            FROM coffees
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let coffee = hydrate_coffee(&mut tx, row).await?;

        // Association rows go with the coffee (ON DELETE CASCADE)
        sqlx::query("DELETE FROM coffees WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;

        debug!(coffee_id = id, "deleted coffee");
        Ok(Some(coffee))
    }
}

// ============================================
// Flavors
// ============================================

#[async_trait]
impl FlavorRepository for Database {
    async fn find_by_id(&self, id: FlavorId) -> StoreResult<Option<Flavor>> {
        let row = sqlx::query_as::<_, FlavorRow>("SELECT id, name FROM flavors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(row.map(Flavor::from))
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Flavor>> {
        let row = sqlx::query_as::<_, FlavorRow>("SELECT id, name FROM flavors WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(row.map(Flavor::from))
    }
}

// ============================================
// Events (read side; writes go through PgUnitOfWork)
// ============================================

#[async_trait]
impl EventRepository for Database {
    async fn find_by_id(&self, id: EventId) -> StoreResult<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, name, type, payload
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(Event::from))
    }

    #[instrument(skip(self))]
    async fn find(&self, filter: EventFilter, page: Pagination) -> StoreResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, name, type, payload
            FROM events
            WHERE ($1::text IS NULL OR name = $1)
              AND ($2::text IS NULL OR type = $2)
            ORDER BY id
            OFFSET $3
            LIMIT $4
            "#,
        )
        .bind(&filter.name)
        .bind(&filter.event_type)
        .bind(i64::from(page.offset))
        .bind(page.limit.map(i64::from))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(Event::from).collect())
    }
}

// ============================================
// Transactions
// ============================================

#[async_trait]
impl TransactionFactory for Database {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await.map_err(db_error)?;
        Ok(Box::new(PgUnitOfWork::new(tx)))
    }
}
