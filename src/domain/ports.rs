use super::basket::{Basket, BasketId};
use super::item::{PriceList, ProductId};
use super::money::Money;
use super::payload::{RequestParameters, ResponseData};
use crate::error::{Result, TransferError};
use async_trait::async_trait;
use std::fmt;

/// Durable storage for baskets and their items.
#[async_trait]
pub trait BasketStore: Send + Sync {
    /// Writes the basket together with all of its items in one atomic step.
    ///
    /// `basket.version()` must match the stored version (0 for a new basket);
    /// otherwise `ConcurrentModification` is returned. Yields the new version.
    async fn save(&self, basket: &Basket) -> Result<u64>;
    /// Loads a basket, hiding soft-deleted ones.
    async fn load(&self, id: BasketId) -> Result<Option<Basket>>;
    async fn load_with_deleted(&self, id: BasketId) -> Result<Option<Basket>>;
    async fn soft_delete(&self, id: BasketId) -> Result<()>;
}

pub type BasketStoreBox = Box<dyn BasketStore>;
pub type BasketStoreFactory = Box<dyn Fn() -> BasketStoreBox + Send + Sync>;

/// Source of current product prices.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn unit_price(&self, product: ProductId) -> Result<Option<Money>>;

    /// Resolves every product up front; unknown products are an error.
    async fn price_list(&self, products: &[ProductId]) -> Result<PriceList> {
        let mut prices = PriceList::new();
        for &product in products {
            let price = self
                .unit_price(product)
                .await?
                .ok_or(TransferError::UnknownProduct(product))?;
            prices.insert(product, price);
        }
        Ok(prices)
    }
}

pub type ProductCatalogBox = Box<dyn ProductCatalog>;

/// Uniform view over whatever a gateway library returns.
pub trait GatewayResponse: Send + Sync + fmt::Debug {
    /// The flow has to continue before an outcome is known.
    fn is_redirect(&self) -> bool;
    fn is_successful(&self) -> bool;
    fn data(&self) -> ResponseData;
}

/// A prepared gateway request. Sending it again continues (polls) the same flow.
#[async_trait]
pub trait GatewayRequest: Send + Sync {
    type Response: GatewayResponse;

    /// Transport failures surface as `GatewayTransport`.
    async fn send(&self) -> Result<Self::Response>;
}

#[async_trait]
pub trait Gateway: Send + Sync {
    type Request: GatewayRequest;

    fn name(&self) -> &str;

    async fn request(
        &self,
        action: &GatewayAction,
        params: RequestParameters,
    ) -> Result<Self::Request>;
}

/// Gateway operation to invoke.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GatewayAction {
    Purchase,
    Authorize,
    CompletePurchase,
    CompleteAuthorize,
    Other(String),
}

impl GatewayAction {
    pub fn name(&self) -> &str {
        match self {
            Self::Purchase => "purchase",
            Self::Authorize => "authorize",
            Self::CompletePurchase => "completePurchase",
            Self::CompleteAuthorize => "completeAuthorize",
            Self::Other(name) => name.as_str(),
        }
    }
}

impl fmt::Display for GatewayAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for GatewayAction {
    fn from(name: &str) -> Self {
        match name {
            "purchase" => Self::Purchase,
            "authorize" => Self::Authorize,
            "completePurchase" => Self::CompletePurchase,
            "completeAuthorize" => Self::CompleteAuthorize,
            other => Self::Other(other.to_string()),
        }
    }
}
