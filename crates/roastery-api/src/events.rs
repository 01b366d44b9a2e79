// Event log HTTP routes (read-only)

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use roastery_core::{Event, EventFilter};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::common::{to_pagination, ListResponse};
use crate::error::ApiResult;
use crate::services::EventService;

/// Query parameters for listing events
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(deny_unknown_fields)]
#[into_params(parameter_in = Query)]
pub struct EventsQuery {
    /// Only events with this name, e.g. `recommend_coffee`
    pub name: Option<String>,
    /// Only events with this type, e.g. `coffee`
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

impl EventsQuery {
    fn filter(&self) -> EventFilter {
        EventFilter {
            name: self.name.clone(),
            event_type: self.event_type.clone(),
        }
    }
}

/// App state for event routes
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<EventService>,
}

impl AppState {
    pub fn new(service: Arc<EventService>) -> Self {
        Self { service }
    }
}

/// Create event routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/events", get(list_events))
        .route("/events/:id", get(get_event))
        .with_state(state)
}

/// GET /events - List recorded events
#[utoipa::path(
    get,
    path = "/events",
    params(EventsQuery),
    responses(
        (status = 200, description = "List of events", body = ListResponse<Event>),
        (status = 400, description = "Invalid query"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn list_events(
    State(state): State<AppState>,
    query: Result<Query<EventsQuery>, QueryRejection>,
) -> ApiResult<Json<ListResponse<Event>>> {
    let Query(query) = query?;
    let page = to_pagination(query.offset, query.limit)?;
    let events = state.service.list(query.filter(), page).await?;
    Ok(Json(ListResponse::new(events)))
}

/// GET /events/{id} - Get event by ID
#[utoipa::path(
    get,
    path = "/events/{id}",
    params(
        ("id" = String, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Event found", body = Event),
        (status = 400, description = "Malformed event ID"),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Event>> {
    Ok(Json(state.service.get(&id).await?))
}
