// Repository traits for pluggable backends
//
// These traits allow services and workflows to run against different backends:
// - In-memory implementations for examples and testing
// - Postgres implementations for production
//
// Components receive the handles they need as constructor arguments; there
// is no global registry.

use async_trait::async_trait;

use crate::coffee::{Coffee, CoffeeDraft, CoffeeId};
use crate::error::Result;
use crate::event::{Event, EventFilter, EventId, NewEvent};
use crate::flavor::{Flavor, FlavorId};
use crate::pagination::Pagination;

// ============================================================================
// CoffeeRepository
// ============================================================================

/// Access to coffee records. Every returned Coffee has its flavors loaded.
#[async_trait]
pub trait CoffeeRepository: Send + Sync {
    async fn find_by_id(&self, id: CoffeeId) -> Result<Option<Coffee>>;

    /// List coffees ordered by id
    async fn find(&self, page: Pagination) -> Result<Vec<Coffee>>;

    /// Insert or update a coffee, writing any pending flavors first.
    ///
    /// Fails with `StoreError::CoffeeNotFound` when updating an id that does
    /// not exist.
    async fn save(&self, draft: CoffeeDraft) -> Result<Coffee>;

    /// Remove a coffee, returning it as it was before removal
    async fn delete(&self, id: CoffeeId) -> Result<Option<Coffee>>;
}

// ============================================================================
// FlavorRepository
// ============================================================================

/// Read access to flavors. Flavors are written by cascading from
/// `CoffeeRepository::save`.
#[async_trait]
pub trait FlavorRepository: Send + Sync {
    async fn find_by_id(&self, id: FlavorId) -> Result<Option<Flavor>>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Flavor>>;
}

// ============================================================================
// EventRepository
// ============================================================================

/// Read access to the event log. Events are appended through a `UnitOfWork`.
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>>;

    /// List matching events ordered by id
    async fn find(&self, filter: EventFilter, page: Pagination) -> Result<Vec<Event>>;
}

// ============================================================================
// Transactions
// ============================================================================

/// Writes that must become visible together.
///
/// Nothing done through a unit of work is visible to other readers until
/// `commit` succeeds. Dropping a unit of work without committing rolls it
/// back and releases its connection.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Atomically add one to the recommendation counter and return the
    /// updated coffee
    async fn increment_recommendations(&mut self, id: CoffeeId) -> Result<Coffee>;

    async fn append_event(&mut self, event: NewEvent) -> Result<Event>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Hands out units of work
#[async_trait]
pub trait TransactionFactory: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>>;
}
