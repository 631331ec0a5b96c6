use basket_transfer::domain::basket::{Basket, BasketId};
use basket_transfer::domain::item::{ItemId, LineItem, ProductId};
use basket_transfer::domain::money::{Currency, Money};
use basket_transfer::domain::ports::{
    BasketStore, BasketStoreBox, BasketStoreFactory, ProductCatalog, ProductCatalogBox,
};
use basket_transfer::infrastructure::in_memory::{InMemoryBasketStore, InMemoryCatalog};

fn basket(id: u64) -> Basket {
    let mut basket = Basket::new(BasketId(id), Currency::new("GBP").unwrap());
    basket
        .add_item(LineItem::new(ItemId(1), ProductId(1), 1).unwrap())
        .unwrap();
    basket
}

#[tokio::test]
async fn test_ports_as_trait_objects() {
    let store: BasketStoreBox = Box::new(InMemoryBasketStore::new());
    let catalog: ProductCatalogBox = Box::new(InMemoryCatalog::from_prices([(
        ProductId(1),
        Money::new(500, Currency::new("GBP").unwrap()),
    )]));

    // Verify Send + Sync by spawning tasks
    let store_handle = tokio::spawn(async move {
        store.save(&basket(1)).await.unwrap();
        store.load(BasketId(1)).await.unwrap().unwrap()
    });

    let catalog_handle =
        tokio::spawn(async move { catalog.unit_price(ProductId(1)).await.unwrap().unwrap() });

    let retrieved = store_handle.await.unwrap();
    assert_eq!(retrieved.id(), BasketId(1));
    assert_eq!(retrieved.version(), 1);

    let price = catalog_handle.await.unwrap();
    assert_eq!(price.amount, 500);
}

#[tokio::test]
async fn test_store_factory_in_task() {
    let factory: BasketStoreFactory =
        Box::new(|| Box::new(InMemoryBasketStore::new()) as BasketStoreBox);

    let handle = tokio::spawn(async move {
        let store = factory();
        store.save(&basket(2)).await.unwrap();
        store.load(BasketId(2)).await.unwrap().unwrap()
    });

    let retrieved = handle.await.unwrap();
    assert_eq!(retrieved.id(), BasketId(2));
}
