// Coffee service for business logic

use std::sync::Arc;

use roastery_core::{
    Coffee, CoffeeDraft, CoffeeId, CoffeeRepository, FlavorLookup, Pagination,
    RecommendationWorkflow,
};

use crate::coffees::{CreateCoffeeRequest, UpdateCoffeeRequest};
use crate::common::parse_id;
use crate::error::{ApiError, ApiResult};

pub struct CoffeeService {
    coffees: Arc<dyn CoffeeRepository>,
    flavors: FlavorLookup,
    recommendations: RecommendationWorkflow,
}

impl CoffeeService {
    pub fn new(
        coffees: Arc<dyn CoffeeRepository>,
        flavors: FlavorLookup,
        recommendations: RecommendationWorkflow,
    ) -> Self {
        Self {
            coffees,
            flavors,
            recommendations,
        }
    }

    pub async fn list(&self, page: Pagination) -> ApiResult<Vec<Coffee>> {
        Ok(self.coffees.find(page).await?)
    }

    pub async fn get(&self, raw_id: &str) -> ApiResult<Coffee> {
        let id = coffee_id(raw_id)?;
        self.coffees
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(raw_id))
    }

    pub async fn create(&self, req: CreateCoffeeRequest) -> ApiResult<Coffee> {
        req.validate()?;
        let flavors = self.flavors.preload_all(req.flavors.as_slice()).await?;
        let coffee = self
            .coffees
            .save(CoffeeDraft::new(req.name, req.brand, flavors))
            .await?;

        tracing::info!(coffee_id = coffee.id, "created coffee");
        Ok(coffee)
    }

    pub async fn update(&self, raw_id: &str, req: UpdateCoffeeRequest) -> ApiResult<Coffee> {
        req.validate()?;
        let existing = self.get(raw_id).await?;

        let mut draft = CoffeeDraft::from_existing(&existing);
        if let Some(name) = req.name {
            draft = draft.with_name(name);
        }
        if let Some(brand) = req.brand {
            draft = draft.with_brand(brand);
        }
        if let Some(names) = req.flavors {
            draft = draft.with_flavors(self.flavors.preload_all(names.as_slice()).await?);
        }

        Ok(self.coffees.save(draft).await?)
    }

    pub async fn remove(&self, raw_id: &str) -> ApiResult<Coffee> {
        let id = coffee_id(raw_id)?;
        let removed = self
            .coffees
            .delete(id)
            .await?
            .ok_or_else(|| not_found(raw_id))?;

        tracing::info!(coffee_id = removed.id, "removed coffee");
        Ok(removed)
    }

    /// Run the recommendation workflow; failures come back after rollback
    pub async fn recommend(&self, raw_id: &str) -> ApiResult<Coffee> {
        let id = coffee_id(raw_id)?;
        Ok(self.recommendations.recommend(id).await?)
    }
}

fn coffee_id(raw_id: &str) -> ApiResult<CoffeeId> {
    parse_id(raw_id)?.ok_or_else(|| not_found(raw_id))
}

fn not_found(raw_id: &str) -> ApiError {
    ApiError::NotFound(format!("Coffee {raw_id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::coffee_service;
    use roastery_core::InMemoryStore;

    fn create_request(name: &str, flavors: &[&str]) -> CreateCoffeeRequest {
        CreateCoffeeRequest {
            name: name.to_string(),
            brand: "Buddy Brew".to_string(),
            flavors: flavors.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_get_non_numeric_is_bad_request() {
        let service = coffee_service(&InMemoryStore::new());

        for raw in ["abc", "1a", ""] {
            assert!(matches!(
                service.get(raw).await,
                Err(ApiError::BadRequest(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_get_missing_numeric_is_not_found() {
        let service = coffee_service(&InMemoryStore::new());

        for raw in ["1", "0", "-5", "123456789012"] {
            assert!(matches!(service.get(raw).await, Err(ApiError::NotFound(_))));
        }
    }

    #[tokio::test]
    async fn test_create_reuses_existing_flavors() {
        let store = InMemoryStore::new();
        let service = coffee_service(&store);

        let first = service
            .create(create_request("Roast", &["chocolate", "vanilla"]))
            .await
            .unwrap();
        let second = service
            .create(create_request("Blend", &["vanilla", "vanilla"]))
            .await
            .unwrap();

        assert_eq!(first.flavors.len(), 2);
        assert_eq!(second.flavors, vec![first.flavors[1].clone()]);
        assert_eq!(store.flavor_count().await, 2);
    }

    #[tokio::test]
    async fn test_update_is_partial() {
        let service = coffee_service(&InMemoryStore::new());
        let coffee = service
            .create(create_request("Roast", &["chocolate"]))
            .await
            .unwrap();

        let updated = service
            .update(
                &coffee.id.to_string(),
                UpdateCoffeeRequest {
                    name: None,
                    brand: Some("Other Brew".to_string()),
                    flavors: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Roast");
        assert_eq!(updated.brand, "Other Brew");
        assert_eq!(updated.flavor_names(), vec!["chocolate"]);
    }

    #[tokio::test]
    async fn test_recommend_surfaces_failure() {
        let store = InMemoryStore::new();
        let service = coffee_service(&store);
        let coffee = service.create(create_request("Roast", &[])).await.unwrap();
        let id = coffee.id.to_string();

        store.fail_event_appends(true);
        assert!(matches!(
            service.recommend(&id).await,
            Err(ApiError::Internal(_))
        ));
        assert_eq!(service.get(&id).await.unwrap().recommendations, 0);

        store.fail_event_appends(false);
        assert_eq!(service.recommend(&id).await.unwrap().recommendations, 1);
    }
}
