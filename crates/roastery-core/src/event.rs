// Event log types
//
// Events are immutable audit records. They are only ever appended, inside
// the transaction of the workflow that produced them.

use serde::{Deserialize, Serialize};
use serde_json::json;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::coffee::CoffeeId;

pub type EventId = i32;

/// Name of the event written by the recommendation workflow
pub const RECOMMEND_COFFEE_EVENT: &str = "recommend_coffee";

/// Type of every event concerning a coffee
pub const COFFEE_EVENT_TYPE: &str = "coffee";

/// A persisted domain event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Event {
    pub id: EventId,
    pub name: String,
    #[serde(rename = "type")]
    pub event_type: String,
    /// Arbitrary structured payload
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub payload: serde_json::Value,
}

/// An event that has not been written yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub name: String,
    pub event_type: String,
    pub payload: serde_json::Value,
}

impl NewEvent {
    pub fn new(
        name: impl Into<String>,
        event_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            event_type: event_type.into(),
            payload,
        }
    }

    /// The audit record for one recommendation of `coffee_id`
    pub fn coffee_recommended(coffee_id: CoffeeId) -> Self {
        Self::new(
            RECOMMEND_COFFEE_EVENT,
            COFFEE_EVENT_TYPE,
            json!({ "coffeeId": coffee_id }),
        )
    }

    pub fn into_event(self, id: EventId) -> Event {
        Event {
            id,
            name: self.name,
            event_type: self.event_type,
            payload: self.payload,
        }
    }
}

/// Lookup filter matching the (name, type) and (name) indexes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub name: Option<String>,
    pub event_type: Option<String>,
}

impl EventFilter {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            event_type: None,
        }
    }

    pub fn with_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn matches(&self, event: &Event) -> bool {
        self.name.as_deref().map_or(true, |n| n == event.name)
            && self
                .event_type
                .as_deref()
                .map_or(true, |t| t == event.event_type)
    }
}
