// Coffee CRUD and recommendation HTTP routes

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use roastery_core::Coffee;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::common::{require_non_blank, ListResponse, PaginationQuery};
use crate::error::ApiResult;
use crate::services::CoffeeService;

/// Request to create a coffee
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateCoffeeRequest {
    #[schema(example = "Shipwreck Roast")]
    pub name: String,
    #[schema(example = "Buddy Brew")]
    pub brand: String,
    /// Flavor names. Unknown flavors are created on save.
    #[schema(example = json!(["chocolate", "vanilla"]))]
    pub flavors: Vec<String>,
}

impl CreateCoffeeRequest {
    pub fn validate(&self) -> ApiResult<()> {
        require_non_blank("name", &self.name)?;
        require_non_blank("brand", &self.brand)?;
        validate_flavors(&self.flavors)
    }
}

/// Partial update of a coffee. Absent fields keep their current value;
/// `flavors`, when present, replaces the whole set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateCoffeeRequest {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub flavors: Option<Vec<String>>,
}

impl UpdateCoffeeRequest {
    pub fn validate(&self) -> ApiResult<()> {
        if let Some(name) = &self.name {
            require_non_blank("name", name)?;
        }
        if let Some(brand) = &self.brand {
            require_non_blank("brand", brand)?;
        }
        if let Some(flavors) = &self.flavors {
            validate_flavors(flavors)?;
        }
        Ok(())
    }
}

fn validate_flavors(flavors: &[String]) -> ApiResult<()> {
    flavors
        .iter()
        .try_for_each(|flavor| require_non_blank("flavors", flavor))
}

/// App state for coffee routes
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CoffeeService>,
}

impl AppState {
    pub fn new(service: Arc<CoffeeService>) -> Self {
        Self { service }
    }
}

/// Create coffee routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/coffees", post(create_coffee).get(list_coffees))
        .route(
            "/coffees/:id",
            get(get_coffee).patch(update_coffee).delete(delete_coffee),
        )
        .route("/coffees/:id/recommend", post(recommend_coffee))
        .with_state(state)
}

/// POST /coffees - Create a new coffee
#[utoipa::path(
    post,
    path = "/coffees",
    request_body = CreateCoffeeRequest,
    responses(
        (status = 201, description = "Coffee created successfully", body = Coffee),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Internal server error")
    ),
    tag = "coffees"
)]
pub async fn create_coffee(
    State(state): State<AppState>,
    payload: Result<Json<CreateCoffeeRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Coffee>)> {
    let Json(req) = payload?;
    let coffee = state.service.create(req).await?;
    Ok((StatusCode::CREATED, Json(coffee)))
}

/// GET /coffees - List coffees with their flavors
#[utoipa::path(
    get,
    path = "/coffees",
    params(PaginationQuery),
    responses(
        (status = 200, description = "List of coffees", body = ListResponse<Coffee>),
        (status = 400, description = "Invalid pagination"),
        (status = 500, description = "Internal server error")
    ),
    tag = "coffees"
)]
pub async fn list_coffees(
    State(state): State<AppState>,
    query: Result<Query<PaginationQuery>, QueryRejection>,
) -> ApiResult<Json<ListResponse<Coffee>>> {
    let Query(query) = query?;
    let coffees = state.service.list(query.into_pagination()?).await?;
    Ok(Json(ListResponse::new(coffees)))
}

/// GET /coffees/{id} - Get coffee by ID
#[utoipa::path(
    get,
    path = "/coffees/{id}",
    params(
        ("id" = String, Path, description = "Coffee ID")
    ),
    responses(
        (status = 200, description = "Coffee found", body = Coffee),
        (status = 400, description = "Malformed coffee ID"),
        (status = 404, description = "Coffee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "coffees"
)]
pub async fn get_coffee(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Coffee>> {
    Ok(Json(state.service.get(&id).await?))
}

/// PATCH /coffees/{id} - Update coffee
#[utoipa::path(
    patch,
    path = "/coffees/{id}",
    params(
        ("id" = String, Path, description = "Coffee ID")
    ),
    request_body = UpdateCoffeeRequest,
    responses(
        (status = 200, description = "Coffee updated successfully", body = Coffee),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Coffee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "coffees"
)]
pub async fn update_coffee(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateCoffeeRequest>, JsonRejection>,
) -> ApiResult<Json<Coffee>> {
    let Json(req) = payload?;
    Ok(Json(state.service.update(&id, req).await?))
}

/// DELETE /coffees/{id} - Remove coffee
#[utoipa::path(
    delete,
    path = "/coffees/{id}",
    params(
        ("id" = String, Path, description = "Coffee ID")
    ),
    responses(
        (status = 200, description = "Coffee removed, returns the removed coffee", body = Coffee),
        (status = 400, description = "Malformed coffee ID"),
        (status = 404, description = "Coffee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "coffees"
)]
pub async fn delete_coffee(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Coffee>> {
    Ok(Json(state.service.remove(&id).await?))
}

/// POST /coffees/{id}/recommend - Recommend a coffee
///
/// Increments the recommendation counter and records a `recommend_coffee`
/// event in one transaction.
#[utoipa::path(
    post,
    path = "/coffees/{id}/recommend",
    params(
        ("id" = String, Path, description = "Coffee ID")
    ),
    responses(
        (status = 200, description = "Recommendation committed", body = Coffee),
        (status = 400, description = "Malformed coffee ID"),
        (status = 404, description = "Coffee not found"),
        (status = 409, description = "Conflicting concurrent write, nothing committed"),
        (status = 500, description = "Recommendation rolled back")
    ),
    tag = "coffees"
)]
pub async fn recommend_coffee(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Coffee>> {
    Ok(Json(state.service.recommend(&id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{coffee_service, send};
    use roastery_core::InMemoryStore;

    fn app(store: &InMemoryStore) -> Router {
        routes(AppState::new(coffee_service(store)))
    }

    fn shipwreck() -> serde_json::Value {
        json!({
            "name": "Shipwreck Roast",
            "brand": "Buddy Brew",
            "flavors": ["chocolate", "vanilla"]
        })
    }

    #[tokio::test]
    async fn test_create_and_get_coffee() {
        let store = InMemoryStore::new();
        let app = app(&store);

        let (status, created) = send(&app, "POST", "/coffees", Some(shipwreck())).await;
        assert_eq!(status, 201);
        assert_eq!(created["id"], 1);
        assert_eq!(created["recommendations"], 0);
        assert_eq!(created["flavors"][0]["name"], "chocolate");
        assert_eq!(created["flavors"][1]["name"], "vanilla");

        let (status, fetched) = send(&app, "GET", "/coffees/1", None).await;
        assert_eq!(status, 200);
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_get_invalid_and_missing_ids() {
        let app = app(&InMemoryStore::new());

        let (status, body) = send(&app, "GET", "/coffees/abc", None).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");

        let (status, body) = send(&app, "GET", "/coffees/99", None).await;
        assert_eq!(status, 404);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_and_blank_fields() {
        let app = app(&InMemoryStore::new());

        let mut unknown = shipwreck();
        unknown["origin"] = json!("Colombia");
        let (status, _) = send(&app, "POST", "/coffees", Some(unknown)).await;
        assert_eq!(status, 400);

        let blank = json!({ "name": "  ", "brand": "Buddy Brew", "flavors": [] });
        let (status, body) = send(&app, "POST", "/coffees", Some(blank)).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"]["message"], "name must not be empty");

        let missing = json!({ "name": "Roast", "brand": "Buddy Brew" });
        let (status, _) = send(&app, "POST", "/coffees", Some(missing)).await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_list_with_pagination() {
        let app = app(&InMemoryStore::new());
        for i in 0..5 {
            let body = json!({ "name": format!("Coffee {i}"), "brand": "Brew", "flavors": [] });
            send(&app, "POST", "/coffees", Some(body)).await;
        }

        let (status, body) = send(&app, "GET", "/coffees?offset=1&limit=2", None).await;
        assert_eq!(status, 200);
        let names: Vec<_> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Coffee 1", "Coffee 2"]);

        let (status, body) = send(&app, "GET", "/coffees", None).await;
        assert_eq!(status, 200);
        assert_eq!(body["data"].as_array().unwrap().len(), 5);

        let (status, _) = send(&app, "GET", "/coffees?limit=-1", None).await;
        assert_eq!(status, 400);
        let (status, _) = send(&app, "GET", "/coffees?limit=0", None).await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_list_includes_each_coffee_flavors() {
        let app = app(&InMemoryStore::new());
        send(&app, "POST", "/coffees", Some(shipwreck())).await;
        let blend = json!({ "name": "Blend", "brand": "Brew", "flavors": ["caramel", "vanilla"] });
        send(&app, "POST", "/coffees", Some(blend)).await;
        let plain = json!({ "name": "Plain", "brand": "Brew", "flavors": [] });
        send(&app, "POST", "/coffees", Some(plain)).await;

        let (status, body) = send(&app, "GET", "/coffees", None).await;
        assert_eq!(status, 200);
        let flavors: Vec<Vec<String>> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| {
                c["flavors"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|f| f["name"].as_str().unwrap().to_string())
                    .collect()
            })
            .collect();
        assert_eq!(
            flavors,
            vec![
                vec!["chocolate", "vanilla"],
                vec!["vanilla", "caramel"],
                vec![],
            ]
        );
    }

    #[tokio::test]
    async fn test_update_coffee() {
        let app = app(&InMemoryStore::new());
        send(&app, "POST", "/coffees", Some(shipwreck())).await;

        let patch = json!({ "brand": "Other Brew", "flavors": ["caramel"] });
        let (status, updated) = send(&app, "PATCH", "/coffees/1", Some(patch)).await;
        assert_eq!(status, 200);
        assert_eq!(updated["name"], "Shipwreck Roast");
        assert_eq!(updated["brand"], "Other Brew");
        assert_eq!(updated["flavors"].as_array().unwrap().len(), 1);
        assert_eq!(updated["flavors"][0]["name"], "caramel");

        let (status, _) = send(&app, "PATCH", "/coffees/7", Some(json!({ "name": "X" }))).await;
        assert_eq!(status, 404);
        let (status, _) = send(&app, "PATCH", "/coffees/x", Some(json!({ "name": "X" }))).await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_delete_returns_removed_coffee() {
        let app = app(&InMemoryStore::new());
        let (_, created) = send(&app, "POST", "/coffees", Some(shipwreck())).await;

        let (status, removed) = send(&app, "DELETE", "/coffees/1", None).await;
        assert_eq!(status, 200);
        assert_eq!(removed, created);

        let (status, _) = send(&app, "DELETE", "/coffees/1", None).await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn test_recommend_coffee() {
        let store = InMemoryStore::new();
        let app = app(&store);
        send(&app, "POST", "/coffees", Some(shipwreck())).await;

        for expected in 1..=4 {
            let (status, coffee) = send(&app, "POST", "/coffees/1/recommend", None).await;
            assert_eq!(status, 200);
            assert_eq!(coffee["recommendations"], expected);
        }
        assert_eq!(store.event_count().await, 4);

        let (status, _) = send(&app, "POST", "/coffees/2/recommend", None).await;
        assert_eq!(status, 404);
        let (status, _) = send(&app, "POST", "/coffees/two/recommend", None).await;
        assert_eq!(status, 400);
        assert_eq!(store.event_count().await, 4);
    }

    #[tokio::test]
    async fn test_failed_recommendation_is_reported_and_rolled_back() {
        let store = InMemoryStore::new();
        let app = app(&store);
        send(&app, "POST", "/coffees", Some(shipwreck())).await;

        store.fail_event_appends(true);
        let (status, body) = send(&app, "POST", "/coffees/1/recommend", None).await;
        assert_eq!(status, 500);
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");

        let (_, coffee) = send(&app, "GET", "/coffees/1", None).await;
        assert_eq!(coffee["recommendations"], 0);
        assert_eq!(store.event_count().await, 0);
    }
}
