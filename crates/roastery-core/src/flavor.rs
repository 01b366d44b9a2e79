// Flavor domain types

use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

pub type FlavorId = i32;

/// Flavor tag, unique by name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Flavor {
    pub id: FlavorId,
    pub name: String,
}

impl Flavor {
    pub fn new(id: FlavorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Result of resolving a flavor name.
///
/// A `Pending` flavor has no row yet; it is written when the coffee that
/// references it is saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlavorRef {
    Persisted(Flavor),
    Pending { name: String },
}

impl FlavorRef {
    pub fn pending(name: impl Into<String>) -> Self {
        FlavorRef::Pending { name: name.into() }
    }

    pub fn name(&self) -> &str {
        match self {
            FlavorRef::Persisted(flavor) => &flavor.name,
            FlavorRef::Pending { name } => name,
        }
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self, FlavorRef::Persisted(_))
    }
}
