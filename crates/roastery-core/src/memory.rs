// In-memory implementations for examples and testing
//
// InMemoryStore keeps every table in one mutex-guarded state and implements
// all repository traits plus TransactionFactory. A unit of work holds the
// lock for its whole lifetime, so transactions are fully serialized, and it
// snapshots the state at begin so a rollback (or drop) restores it exactly.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::coffee::{Coffee, CoffeeDraft, CoffeeId};
use crate::error::{Result, StoreError};
use crate::event::{Event, EventFilter, EventId, NewEvent};
use crate::flavor::{Flavor, FlavorId, FlavorRef};
use crate::pagination::Pagination;
use crate::traits::{
    CoffeeRepository, EventRepository, FlavorRepository, TransactionFactory, UnitOfWork,
};

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone)]
struct CoffeeRecord {
    id: CoffeeId,
    name: String,
    brand: String,
    recommendations: i32,
    flavor_ids: BTreeSet<FlavorId>,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    coffees: BTreeMap<CoffeeId, CoffeeRecord>,
    flavors: BTreeMap<FlavorId, Flavor>,
    events: Vec<Event>,
    last_coffee_id: CoffeeId,
    last_flavor_id: FlavorId,
    last_event_id: EventId,
}

impl MemoryState {
    fn hydrate(&self, record: &CoffeeRecord) -> Coffee {
        Coffee {
            id: record.id,
            name: record.name.clone(),
            brand: record.brand.clone(),
            recommendations: record.recommendations,
            flavors: record
                .flavor_ids
                .iter()
                .filter_map(|id| self.flavors.get(id).cloned())
                .collect(),
        }
    }

    fn flavor_by_name(&self, name: &str) -> Option<&Flavor> {
        self.flavors.values().find(|f| f.name == name)
    }

    /// Insert the flavor unless one with the same name exists; either way
    /// return the id of the stored row
    fn upsert_flavor(&mut self, flavor: &FlavorRef) -> FlavorId {
        if let Some(existing) = self.flavor_by_name(flavor.name()) {
            return existing.id;
        }
        self.last_flavor_id += 1;
        let id = self.last_flavor_id;
        self.flavors.insert(id, Flavor::new(id, flavor.name()));
        id
    }

    fn save(&mut self, draft: CoffeeDraft) -> Result<Coffee> {
        if let Some(id) = draft.id {
            if !self.coffees.contains_key(&id) {
                return Err(StoreError::CoffeeNotFound(id));
            }
        }

        let flavor_ids: BTreeSet<FlavorId> =
            draft.flavors.iter().map(|f| self.upsert_flavor(f)).collect();

        let id = match draft.id {
            Some(id) => id,
            None => {
                self.last_coffee_id += 1;
                self.last_coffee_id
            }
        };
        let recommendations = self.coffees.get(&id).map_or(0, |c| c.recommendations);

        let record = CoffeeRecord {
            id,
            name: draft.name,
            brand: draft.brand,
            recommendations,
            flavor_ids,
        };
        let coffee = self.hydrate(&record);
        self.coffees.insert(id, record);
        Ok(coffee)
    }
}

// ============================================================================
// InMemoryStore
// ============================================================================

/// In-memory backend for all repositories
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_event_appends: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent event append fail with a database error
    pub fn fail_event_appends(&self, fail: bool) {
        self.fail_event_appends.store(fail, Ordering::SeqCst);
    }

    pub async fn coffee_count(&self) -> usize {
        self.state.lock().await.coffees.len()
    }

    pub async fn flavor_count(&self) -> usize {
        self.state.lock().await.flavors.len()
    }

    pub async fn event_count(&self) -> usize {
        self.state.lock().await.events.len()
    }
}

#[async_trait]
impl CoffeeRepository for InMemoryStore {
    async fn find_by_id(&self, id: CoffeeId) -> Result<Option<Coffee>> {
        let state = self.state.lock().await;
        Ok(state.coffees.get(&id).map(|r| state.hydrate(r)))
    }

    async fn find(&self, page: Pagination) -> Result<Vec<Coffee>> {
        let state = self.state.lock().await;
        Ok(page
            .apply(state.coffees.values())
            .map(|r| state.hydrate(r))
            .collect())
    }

    async fn save(&self, draft: CoffeeDraft) -> Result<Coffee> {
        self.state.lock().await.save(draft)
    }

    async fn delete(&self, id: CoffeeId) -> Result<Option<Coffee>> {
        let mut state = self.state.lock().await;
        let removed = state.coffees.remove(&id);
        Ok(removed.map(|r| state.hydrate(&r)))
    }
}

#[async_trait]
impl FlavorRepository for InMemoryStore {
    async fn find_by_id(&self, id: FlavorId) -> Result<Option<Flavor>> {
        Ok(self.state.lock().await.flavors.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Flavor>> {
        Ok(self.state.lock().await.flavor_by_name(name).cloned())
    }
}

#[async_trait]
impl EventRepository for InMemoryStore {
    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>> {
        let state = self.state.lock().await;
        Ok(state.events.iter().find(|e| e.id == id).cloned())
    }

    async fn find(&self, filter: EventFilter, page: Pagination) -> Result<Vec<Event>> {
        let state = self.state.lock().await;
        Ok(page
            .apply(state.events.iter().filter(|e| filter.matches(e)))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TransactionFactory for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let guard = self.state.clone().lock_owned().await;
        let snapshot = guard.clone();
        Ok(Box::new(InMemoryTransaction {
            guard,
            snapshot: Some(snapshot),
            fail_event_appends: self.fail_event_appends.clone(),
        }))
    }
}

// ============================================================================
// InMemoryTransaction
// ============================================================================

/// Unit of work over the in-memory state
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    /// State at begin; `None` once committed
    snapshot: Option<MemoryState>,
    fail_event_appends: Arc<AtomicBool>,
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.guard = snapshot;
        }
    }
}

#[async_trait]
impl UnitOfWork for InMemoryTransaction {
    async fn increment_recommendations(&mut self, id: CoffeeId) -> Result<Coffee> {
        let record = self
            .guard
            .coffees
            .get_mut(&id)
            .ok_or(StoreError::CoffeeNotFound(id))?;
        record.recommendations = record
            .recommendations
            .checked_add(1)
            .ok_or_else(|| StoreError::database("recommendations overflow"))?;
        let record = record.clone();
        Ok(self.guard.hydrate(&record))
    }

    async fn append_event(&mut self, event: NewEvent) -> Result<Event> {
        if self.fail_event_appends.load(Ordering::SeqCst) {
            return Err(StoreError::database("event append failed"));
        }
        self.guard.last_event_id += 1;
        let event = event.into_event(self.guard.last_event_id);
        self.guard.events.push(event.clone());
        Ok(event)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut tx = self;
        tx.snapshot = None;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        // Drop restores the snapshot
        Ok(())
    }
}
