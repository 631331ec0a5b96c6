use super::basket::BasketId;
use super::freeze::{Freezable, FrozenValue};
use super::money::{Currency, Money};
use crate::error::{Result, TransferError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolves the current unit price of a product.
pub trait PriceLookup {
    fn unit_price(&self, product: ProductId) -> Result<Money>;
}

/// A snapshot of catalog prices, typically fetched through a `ProductCatalog`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceList {
    prices: HashMap<ProductId, Money>,
}

impl PriceList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, product: ProductId, price: Money) {
        self.prices.insert(product, price);
    }

    pub fn with(mut self, product: ProductId, price: Money) -> Self {
        self.insert(product, price);
        self
    }
}

impl PriceLookup for PriceList {
    fn unit_price(&self, product: ProductId) -> Result<Money> {
        self.prices
            .get(&product)
            .copied()
            .ok_or(TransferError::UnknownProduct(product))
    }
}

/// A quantified reference to a priced product inside a basket.
///
/// Until frozen the unit value is looked up from the catalog on demand; once
/// frozen it is the amount captured at freeze time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    id: ItemId,
    /// Owning basket, kept only as a join key for storage.
    basket_id: Option<BasketId>,
    product_id: ProductId,
    quantity: u32,
    #[serde(flatten)]
    frozen: FrozenValue,
}

impl LineItem {
    pub fn new(id: ItemId, product_id: ProductId, quantity: u32) -> Result<Self> {
        validate_quantity(quantity)?;
        Ok(Self {
            id,
            basket_id: None,
            product_id,
            quantity,
            frozen: FrozenValue::default(),
        })
    }

    /// Rebuilds an item whose unit value was already frozen elsewhere.
    pub fn frozen(id: ItemId, product_id: ProductId, quantity: u32, unit_value: i64) -> Result<Self> {
        let mut item = Self::new(id, product_id, quantity)?;
        item.frozen.freeze(unit_value);
        Ok(item)
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn basket_id(&self) -> Option<BasketId> {
        self.basket_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn set_quantity(&mut self, quantity: u32) -> Result<()> {
        self.ensure_mutable()?;
        validate_quantity(quantity)?;
        self.quantity = quantity;
        Ok(())
    }

    pub fn set_product(&mut self, product_id: ProductId) -> Result<()> {
        self.ensure_mutable()?;
        self.product_id = product_id;
        Ok(())
    }

    /// Price of a single unit in `currency`.
    pub fn unit_value(&self, currency: Currency, prices: &impl PriceLookup) -> Result<Money> {
        if let Some(value) = self.frozen.value() {
            return Ok(Money::new(value, currency));
        }
        let price = prices.unit_price(self.product_id)?;
        if price.currency != currency {
            return Err(TransferError::CurrencyMismatch {
                expected: currency,
                found: price.currency,
            });
        }
        Ok(price)
    }

    /// Contribution of this item to the basket total.
    pub fn value(&self, currency: Currency, prices: &impl PriceLookup) -> Result<Money> {
        self.unit_value(currency, prices)?.times(self.quantity)
    }

    pub(crate) fn attach(&mut self, basket_id: BasketId) {
        self.basket_id = Some(basket_id);
    }

    pub(crate) fn freeze(&mut self, unit_value: i64) -> bool {
        self.frozen.freeze(unit_value)
    }
}

impl Freezable for LineItem {
    const KIND: &'static str = "line item";

    fn frozen_value(&self) -> &FrozenValue {
        &self.frozen
    }
}

fn validate_quantity(quantity: u32) -> Result<()> {
    if quantity == 0 {
        return Err(TransferError::Validation(
            "Quantity must be positive".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gbp() -> Currency {
        Currency::new("GBP").unwrap()
    }

    fn prices() -> PriceList {
        PriceList::new()
            .with(ProductId(1), Money::new(10000, gbp()))
            .with(ProductId(2), Money::new(20000, gbp()))
    }

    #[test]
    fn test_value_uses_catalog_until_frozen() {
        let item = LineItem::new(ItemId(1), ProductId(1), 2).unwrap();
        assert_eq!(item.value(gbp(), &prices()).unwrap().amount, 20000);

        let repriced = PriceList::new().with(ProductId(1), Money::new(500, gbp()));
        assert_eq!(item.value(gbp(), &repriced).unwrap().amount, 1000);
    }

    #[test]
    fn test_frozen_item_ignores_catalog() {
        let item = LineItem::frozen(ItemId(1), ProductId(1), 3, 2000).unwrap();
        let empty = PriceList::new();
        assert_eq!(item.value(gbp(), &empty).unwrap().amount, 6000);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        assert!(matches!(
            LineItem::new(ItemId(1), ProductId(1), 0),
            Err(TransferError::Validation(_))
        ));
        let mut item = LineItem::new(ItemId(1), ProductId(1), 1).unwrap();
        assert!(item.set_quantity(0).is_err());
        assert_eq!(item.quantity(), 1);
    }

    #[test]
    fn test_frozen_item_rejects_mutation() {
        let mut item = LineItem::new(ItemId(1), ProductId(1), 2).unwrap();
        assert!(item.freeze(10000));

        assert!(matches!(
            item.set_quantity(5),
            Err(TransferError::FrozenState(_))
        ));
        assert!(matches!(
            item.set_product(ProductId(2)),
            Err(TransferError::FrozenState(_))
        ));
        assert_eq!(item.quantity(), 2);
        assert_eq!(item.product_id(), ProductId(1));
    }

    #[test]
    fn test_unknown_product() {
        let item = LineItem::new(ItemId(1), ProductId(99), 1).unwrap();
        assert!(matches!(
            item.value(gbp(), &prices()),
            Err(TransferError::UnknownProduct(ProductId(99)))
        ));
    }

    #[test]
    fn test_price_in_other_currency_fails_fast() {
        let item = LineItem::new(ItemId(1), ProductId(1), 1).unwrap();
        let eur_prices =
            PriceList::new().with(ProductId(1), Money::new(100, Currency::new("EUR").unwrap()));
        assert!(matches!(
            item.value(gbp(), &eur_prices),
            Err(TransferError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn test_item_serialization_shape() {
        let item = LineItem::frozen(ItemId(1), ProductId(2), 4, 20000).unwrap();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["isFrozen"], true);
        assert_eq!(json["value"], 20000);
        assert_eq!(json["productId"], 2);

        let back: LineItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }
}
