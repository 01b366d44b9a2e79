// Event service: read-only access to the event log

use std::sync::Arc;

use roastery_core::{Event, EventFilter, EventRepository, Pagination};

use crate::common::parse_id;
use crate::error::{ApiError, ApiResult};

pub struct EventService {
    events: Arc<dyn EventRepository>,
}

impl EventService {
    pub fn new(events: Arc<dyn EventRepository>) -> Self {
        Self { events }
    }

    pub async fn list(&self, filter: EventFilter, page: Pagination) -> ApiResult<Vec<Event>> {
        Ok(self.events.find(filter, page).await?)
    }

    pub async fn get(&self, raw_id: &str) -> ApiResult<Event> {
        let not_found = || ApiError::NotFound(format!("Event {raw_id} not found"));
        let id = parse_id(raw_id)?.ok_or_else(not_found)?;
        self.events.find_by_id(id).await?.ok_or_else(not_found)
    }
}
