use crate::domain::basket::{Basket, BasketId};
use crate::domain::item::ProductId;
use crate::domain::money::Money;
use crate::domain::ports::{BasketStore, ProductCatalog};
use crate::error::{Result, TransferError};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for baskets.
///
/// Uses `Arc<RwLock<HashMap<BasketId, Basket>>>` to allow shared concurrent access.
/// A basket and its items live in one map entry, so every save is atomic.
#[derive(Default, Clone)]
pub struct InMemoryBasketStore {
    baskets: Arc<RwLock<HashMap<BasketId, Basket>>>,
}

impl InMemoryBasketStore {
    /// Creates a new, empty in-memory basket store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BasketStore for InMemoryBasketStore {
    async fn save(&self, basket: &Basket) -> Result<u64> {
        let mut baskets = self.baskets.write().await;
        let found = baskets.get(&basket.id()).map_or(0, Basket::version);
        if found != basket.version() {
            return Err(TransferError::ConcurrentModification {
                id: basket.id(),
                expected: basket.version(),
                found,
            });
        }

        let version = found + 1;
        let mut stored = basket.clone();
        stored.set_version(version);
        baskets.insert(stored.id(), stored);
        Ok(version)
    }

    async fn load(&self, id: BasketId) -> Result<Option<Basket>> {
        let baskets = self.baskets.read().await;
        Ok(baskets
            .get(&id)
            .filter(|basket| !basket.is_deleted())
            .cloned())
    }

    async fn load_with_deleted(&self, id: BasketId) -> Result<Option<Basket>> {
        let baskets = self.baskets.read().await;
        Ok(baskets.get(&id).cloned())
    }

    async fn soft_delete(&self, id: BasketId) -> Result<()> {
        let mut baskets = self.baskets.write().await;
        let basket = baskets.get_mut(&id).ok_or(TransferError::NotFound(id))?;
        if !basket.is_deleted() {
            basket.mark_deleted(Utc::now());
            basket.set_version(basket.version() + 1);
        }
        Ok(())
    }
}

/// A fixed product catalog held in memory.
#[derive(Default, Clone)]
pub struct InMemoryCatalog {
    prices: Arc<RwLock<HashMap<ProductId, Money>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_prices(prices: impl IntoIterator<Item = (ProductId, Money)>) -> Self {
        Self {
            prices: Arc::new(RwLock::new(prices.into_iter().collect())),
        }
    }

    /// Sets or replaces the price of a product.
    pub async fn set_price(&self, product: ProductId, price: Money) {
        self.prices.write().await.insert(product, price);
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn unit_price(&self, product: ProductId) -> Result<Option<Money>> {
        let prices = self.prices.read().await;
        Ok(prices.get(&product).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::{ItemId, LineItem};
    use crate::domain::money::Currency;

    fn gbp() -> Currency {
        Currency::new("GBP").unwrap()
    }

    fn basket(id: u64) -> Basket {
        let mut basket = Basket::new(BasketId(id), gbp());
        basket
            .add_item(LineItem::new(ItemId(1), ProductId(1), 2).unwrap())
            .unwrap();
        basket
    }

    #[tokio::test]
    async fn test_in_memory_basket_store() {
        let store = InMemoryBasketStore::new();
        let mut basket = basket(1);

        let version = store.save(&basket).await.unwrap();
        assert_eq!(version, 1);
        basket.set_version(version);

        let retrieved = store.load(BasketId(1)).await.unwrap().unwrap();
        assert_eq!(retrieved, basket);
        assert_eq!(retrieved.items().len(), 1);

        assert!(store.load(BasketId(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_save_is_rejected() {
        let store = InMemoryBasketStore::new();
        let stale = basket(1);
        let mut fresh = stale.clone();

        fresh.set_version(store.save(&fresh).await.unwrap());
        store.save(&fresh).await.unwrap();

        let err = store.save(&stale).await.unwrap_err();
        assert!(matches!(
            err,
            TransferError::ConcurrentModification {
                expected: 0,
                found: 2,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_soft_delete_keeps_history() {
        let store = InMemoryBasketStore::new();
        store.save(&basket(1)).await.unwrap();

        store.soft_delete(BasketId(1)).await.unwrap();

        assert!(store.load(BasketId(1)).await.unwrap().is_none());
        let deleted = store.load_with_deleted(BasketId(1)).await.unwrap().unwrap();
        assert!(deleted.is_deleted());
        assert!(deleted.deleted_at().is_some());
        assert_eq!(deleted.items().len(), 1);

        assert!(matches!(
            store.soft_delete(BasketId(9)).await,
            Err(TransferError::NotFound(BasketId(9)))
        ));
    }

    #[tokio::test]
    async fn test_in_memory_catalog() {
        let catalog = InMemoryCatalog::from_prices([(ProductId(1), Money::new(100, gbp()))]);
        assert_eq!(
            catalog.unit_price(ProductId(1)).await.unwrap(),
            Some(Money::new(100, gbp()))
        );
        assert!(catalog.unit_price(ProductId(2)).await.unwrap().is_none());

        catalog.set_price(ProductId(2), Money::new(250, gbp())).await;
        let prices = catalog
            .price_list(&[ProductId(1), ProductId(2)])
            .await
            .unwrap();
        assert_eq!(
            crate::domain::item::PriceLookup::unit_price(&prices, ProductId(2)).unwrap(),
            Money::new(250, gbp())
        );

        assert!(matches!(
            catalog.price_list(&[ProductId(3)]).await,
            Err(TransferError::UnknownProduct(ProductId(3)))
        ));
    }
}
