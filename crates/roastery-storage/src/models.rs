// Database models (internal, may differ from domain types)

use roastery_core::{Event, Flavor};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct CoffeeRow {
    pub id: i32,
    pub name: String,
    pub brand: String,
    pub recommendations: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct FlavorRow {
    pub id: i32,
    pub name: String,
}

impl From<FlavorRow> for Flavor {
    fn from(row: FlavorRow) -> Self {
        Flavor::new(row.id, row.name)
    }
}

/// Flavor joined through coffees_flavors, keyed by owning coffee
#[derive(Debug, Clone, FromRow)]
pub struct CoffeeFlavorRow {
    pub coffee_id: i32,
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: i32,
    pub name: String,
    #[sqlx(rename = "type")]
    pub event_type: String,
    pub payload: sqlx::types::JsonValue,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id,
            name: row.name,
            event_type: row.event_type,
            payload: row.payload,
        }
    }
}
