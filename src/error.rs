use crate::domain::basket::BasketId;
use crate::domain::item::{ItemId, ProductId};
use crate::domain::money::Currency;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Cannot modify frozen {0}")]
    FrozenState(String),
    #[error("Basket must be frozen before transfer parameters can be built")]
    NotFrozen,
    #[error("Currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch { expected: Currency, found: Currency },
    #[error("Unknown product: {0}")]
    UnknownProduct(ProductId),
    #[error("Unknown item: {0}")]
    UnknownItem(ItemId),
    #[error("Gateway transport error: {0}")]
    GatewayTransport(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Gateway still redirecting after {attempts} attempts")]
    RedirectLimitExceeded { attempts: u32 },
    #[error("Gateway did not reach a terminal response within {elapsed:?}")]
    RedirectTimeout { elapsed: Duration },
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Basket {id} was modified concurrently (expected version {expected}, found {found})")]
    ConcurrentModification {
        id: BasketId,
        expected: u64,
        found: u64,
    },
    #[error("Basket not found: {0}")]
    NotFound(BasketId),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    InternalError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<serde_json::Error> for TransferError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TransferError>;
