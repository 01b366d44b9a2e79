// Flavor lookup
//
// Resolves flavor names submitted with a coffee into either the stored
// flavor or a pending placeholder. Nothing is written here; pending flavors
// are persisted when the owning coffee is saved.

use std::sync::Arc;

use futures::future::try_join_all;

use crate::error::Result;
use crate::flavor::FlavorRef;
use crate::traits::FlavorRepository;

#[derive(Clone)]
pub struct FlavorLookup {
    flavors: Arc<dyn FlavorRepository>,
}

impl FlavorLookup {
    pub fn new(flavors: Arc<dyn FlavorRepository>) -> Self {
        Self { flavors }
    }

    /// Return the stored flavor named `name`, or a pending one if none exists
    pub async fn preload(&self, name: &str) -> Result<FlavorRef> {
        match self.flavors.find_by_name(name).await? {
            Some(flavor) => Ok(FlavorRef::Persisted(flavor)),
            None => Ok(FlavorRef::pending(name)),
        }
    }

    /// Resolve several names concurrently. Repeated names collapse to the
    /// first occurrence.
    pub async fn preload_all<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<FlavorRef>> {
        let mut unique: Vec<&str> = Vec::with_capacity(names.len());
        for name in names.iter().map(AsRef::as_ref) {
            if !unique.contains(&name) {
                unique.push(name);
            }
        }

        try_join_all(unique.into_iter().map(|name| self.preload(name))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coffee::CoffeeDraft;
    use crate::memory::InMemoryStore;
    use crate::traits::CoffeeRepository;

    #[tokio::test]
    async fn test_unknown_name_is_pending() {
        let store = InMemoryStore::new();
        let lookup = FlavorLookup::new(Arc::new(store.clone()));

        let flavor = lookup.preload("chocolate").await.unwrap();

        assert_eq!(flavor, FlavorRef::pending("chocolate"));
        // Lookup alone never writes
        assert_eq!(store.flavor_count().await, 0);
    }

    #[tokio::test]
    async fn test_lookup_is_idempotent_after_persist() {
        let store = InMemoryStore::new();
        let lookup = FlavorLookup::new(Arc::new(store.clone()));

        let pending = lookup.preload("vanilla").await.unwrap();
        store
            .save(CoffeeDraft::new("Roast", "Brew", vec![pending]))
            .await
            .unwrap();

        let first = lookup.preload("vanilla").await.unwrap();
        let second = lookup.preload("vanilla").await.unwrap();

        assert!(first.is_persisted());
        assert_eq!(first, second);
        assert_eq!(store.flavor_count().await, 1);
    }

    #[tokio::test]
    async fn test_preload_all_deduplicates() {
        let store = InMemoryStore::new();
        let lookup = FlavorLookup::new(Arc::new(store.clone()));

        let flavors = lookup
            .preload_all(&["chocolate", "vanilla", "chocolate"])
            .await
            .unwrap();

        let names: Vec<_> = flavors.iter().map(FlavorRef::name).collect();
        assert_eq!(names, vec!["chocolate", "vanilla"]);
    }
}
