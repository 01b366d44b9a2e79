// Coffee domain types
//
// Coffee is the primary catalogue record. Its flavors are always loaded
// together with it, so a Coffee value is never missing its relations.

use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::flavor::{Flavor, FlavorRef};

pub type CoffeeId = i32;

/// A coffee product together with its flavor tags
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Coffee {
    pub id: CoffeeId,
    pub name: String,
    pub brand: String,
    /// Number of times this coffee was recommended. Never negative.
    pub recommendations: i32,
    /// Associated flavors, ordered by flavor id.
    #[serde(default)]
    pub flavors: Vec<Flavor>,
}

impl Coffee {
    pub fn flavor_names(&self) -> Vec<&str> {
        self.flavors.iter().map(|f| f.name.as_str()).collect()
    }
}

/// Coffee as handed to `CoffeeRepository::save`.
///
/// `id: None` inserts a new record with zero recommendations, `Some(id)`
/// rewrites name, brand and the flavor set of an existing one. The
/// recommendation counter is not part of a draft: only the recommendation
/// workflow changes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoffeeDraft {
    pub id: Option<CoffeeId>,
    pub name: String,
    pub brand: String,
    pub flavors: Vec<FlavorRef>,
}

impl CoffeeDraft {
    pub fn new(name: impl Into<String>, brand: impl Into<String>, flavors: Vec<FlavorRef>) -> Self {
        Self {
            id: None,
            name: name.into(),
            brand: brand.into(),
            flavors,
        }
    }

    /// Start an update from the stored state of a coffee
    pub fn from_existing(coffee: &Coffee) -> Self {
        Self {
            id: Some(coffee.id),
            name: coffee.name.clone(),
            brand: coffee.brand.clone(),
            flavors: coffee
                .flavors
                .iter()
                .cloned()
                .map(FlavorRef::Persisted)
                .collect(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = brand.into();
        self
    }

    pub fn with_flavors(mut self, flavors: Vec<FlavorRef>) -> Self {
        self.flavors = flavors;
        self
    }
}
