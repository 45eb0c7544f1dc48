//! The item flowing through the bakery.

use crate::utils::generate_uuid;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of an item.
///
/// Generated once when the item is created and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Generates a fresh, unique id.
    #[must_use]
    pub fn generate() -> Self {
        Self(generate_uuid().to_string())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The kind of pizza being prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// Tomato, mozzarella, basil.
    Margherita,
    /// Tomato, mozzarella, pepperoni.
    Pepperoni,
}

impl ItemType {
    /// All item types, in declaration order.
    pub const ALL: [Self; 2] = [Self::Margherita, Self::Pepperoni];

    /// Picks a type uniformly at random.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Margherita => write!(f, "margherita"),
            Self::Pepperoni => write!(f, "pepperoni"),
        }
    }
}

/// The unit of work processed by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique id.
    pub id: ItemId,
    /// Item type.
    #[serde(rename = "type")]
    pub item_type: ItemType,
}

impl Item {
    /// Creates an item with a freshly generated id.
    #[must_use]
    pub fn new(item_type: ItemType) -> Self {
        Self::with_id(ItemId::generate(), item_type)
    }

    /// Creates an item with an explicit id.
    #[must_use]
    pub fn with_id(id: impl Into<ItemId>, item_type: ItemType) -> Self {
        Self {
            id: id.into(),
            item_type,
        }
    }

    /// Structured fields used in log events and span attributes.
    #[must_use]
    pub fn to_fields(&self) -> serde_json::Value {
        serde_json::json!({
            "item_id": self.id.as_str(),
            "item_type": self.item_type.to_string(),
        })
    }
}
