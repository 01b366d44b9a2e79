// Roastery core
//
// DB-agnostic building blocks for the coffee catalogue:
// - Domain entity types (Coffee, Flavor, Event) shared by storage and API
// - Repository traits per entity plus an explicit unit-of-work for transactions
// - Flavor lookup (resolve a name to a persisted or pending flavor)
// - The recommendation workflow (counter increment + audit event, atomically)
// - An in-memory backend implementing every trait, for tests and examples

// Domain entity types
pub mod coffee;
pub mod event;
pub mod flavor;
pub mod pagination;

pub mod error;
pub mod lookup;
pub mod recommend;
pub mod traits;
pub mod transaction;

// In-memory implementations for examples and testing
pub mod memory;

// Re-exports for convenience
pub use coffee::{Coffee, CoffeeDraft, CoffeeId};
pub use error::StoreError;
pub use event::{Event, EventFilter, EventId, NewEvent, COFFEE_EVENT_TYPE, RECOMMEND_COFFEE_EVENT};
pub use flavor::{Flavor, FlavorId, FlavorRef};
pub use lookup::FlavorLookup;
pub use memory::InMemoryStore;
pub use pagination::Pagination;
pub use recommend::RecommendationWorkflow;
pub use traits::{
    CoffeeRepository, EventRepository, FlavorRepository, TransactionFactory, UnitOfWork,
};
pub use transaction::with_transaction;
