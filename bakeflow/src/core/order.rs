//! Order envelope submitted by clients.

use super::item::{Item, ItemType};
use crate::utils::generate_uuid;
use serde::{Deserialize, Serialize};

/// The client placing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Opaque client id.
    pub id: String,
}

/// A client paired with the item they ordered.
///
/// The pipeline only ever sees the [`Item`]; the envelope belongs to the
/// transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Who ordered.
    pub client: Client,
    /// What was ordered.
    #[serde(rename = "product")]
    pub item: Item,
}

impl Order {
    /// Creates an order for a new client and a new item of the given type.
    #[must_use]
    pub fn create(item_type: ItemType) -> Self {
        Self {
            client: Client {
                id: generate_uuid().to_string(),
            },
            item: Item::new(item_type),
        }
    }

    /// Consumes the order, returning the item.
    #[must_use]
    pub fn into_item(self) -> Item {
        self.item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mints_fresh_ids() {
        let a = Order::create(ItemType::Margherita);
        let b = Order::create(ItemType::Margherita);

        assert_ne!(a.client.id, b.client.id);
        assert_ne!(a.item.id, b.item.id);
        assert_eq!(a.item.item_type, ItemType::Margherita);
    }

    #[test]
    fn test_order_json_shape() {
        let order = Order::create(ItemType::Pepperoni);
        let value = serde_json::to_value(&order).unwrap();

        assert!(value["client"]["id"].is_string());
        assert_eq!(value["product"]["type"], "pepperoni");
        assert_eq!(order.into_item().item_type, ItemType::Pepperoni);
    }
}
