//! Trait seam for anything that can process items.

use super::bakery::Bakery;
use crate::cancellation::CancellationToken;
use crate::core::Item;
use crate::errors::BakeryResult;
use async_trait::async_trait;

/// Something that turns a raw item into a finished one.
///
/// Transports depend on this trait rather than on [`Bakery`] directly.
#[async_trait]
pub trait ItemProcessor: Send + Sync {
    /// Processes `item`, stopping early if `cancel` fires.
    async fn process(&self, item: Item, cancel: &CancellationToken) -> BakeryResult<Item>;
}

#[async_trait]
impl ItemProcessor for Bakery {
    async fn process(&self, item: Item, cancel: &CancellationToken) -> BakeryResult<Item> {
        Bakery::process(self, item, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BakeryConfig;
    use crate::core::ItemType;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_bakery_behind_trait_object() {
        let bakery = Bakery::new(BakeryConfig::default().with_time_unit(Duration::from_millis(1)))
            .unwrap();
        let processor: Arc<dyn ItemProcessor> = Arc::new(bakery);
        let item = Item::new(ItemType::Margherita);

        let done = processor.process(item.clone(), &CancellationToken::new()).await;
        let done = tokio_test::assert_ok!(done);
        assert_eq!(done, item);
    }
}
