// Postgres-backed UnitOfWork
//
// Wraps one sqlx transaction. sqlx rolls the transaction back when it is
// dropped uncommitted, so an abandoned unit of work (including a request
// future cancelled by a timeout) never leaves partial writes behind.

use async_trait::async_trait;
use roastery_core::error::Result;
use roastery_core::{Coffee, CoffeeId, Event, NewEvent, StoreError, UnitOfWork};
use sqlx::{Postgres, Transaction};
use tracing::{debug, instrument};

use crate::models::{CoffeeRow, EventRow};
use crate::repositories::{db_error, hydrate_coffee};

pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl PgUnitOfWork {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    #[instrument(skip(self))]
    async fn increment_recommendations(&mut self, id: CoffeeId) -> Result<Coffee> {
        // Single-statement increment: the row lock taken by UPDATE makes
        // concurrent recommendations queue instead of overwriting each other
        let row = sqlx::query_as::<_, CoffeeRow>(
            r#"
            UPDATE coffees
            SET recommendations = recommendations + 1
            WHERE id = $1
            RETURNING id, name, brand, recommendations
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error)?
        .ok_or(StoreError::CoffeeNotFound(id))?;

        hydrate_coffee(&mut self.tx, row).await
    }

    #[instrument(skip(self, event), fields(name = %event.name))]
    async fn append_event(&mut self, event: NewEvent) -> Result<Event> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            INSERT INTO events (name, type, payload)
            VALUES ($1, $2, $3)
            RETURNING id, name, type, payload
            "#,
        )
        .bind(&event.name)
        .bind(&event.event_type)
        .bind(&event.payload)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error)?;

        debug!(event_id = row.id, "appended event");
        Ok(row.into())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(db_error)
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await.map_err(db_error)
    }
}
