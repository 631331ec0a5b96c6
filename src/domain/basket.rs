use super::freeze::{Freezable, FrozenValue};
use super::item::{ItemId, LineItem, PriceLookup};
use super::money::{Currency, Money, compute_value};
use super::payload::{RequestParameters, ResponseData, stored_text};
use crate::error::{Result, TransferError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BasketId(pub u64);

impl fmt::Display for BasketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a basket is in its transfer lifecycle, derived from the recorded fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    /// No gateway response recorded yet.
    Unsent,
    /// A redirect response was recorded; the outcome is still open.
    Pending,
    Completed,
    Failed,
}

impl TransferState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Amount and currency of a transfer, as a gateway expects them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransferParameters {
    pub amount: Decimal,
    pub currency: Currency,
}

/// The aggregate whose total is charged through the gateway.
///
/// A basket owns its line items. While unfrozen its value is derived from the
/// items on demand; `freeze` fixes the item and basket values for good. The
/// transfer fields (`response_data`, `is_successful`, `completed_at`) are only
/// written by the gateway response recorders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Basket {
    id: BasketId,
    currency: Currency,
    #[serde(flatten)]
    frozen: FrozenValue,
    #[serde(default)]
    is_successful: Option<bool>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default, with = "stored_text")]
    response_data: Option<ResponseData>,
    #[serde(default)]
    deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    items: Vec<LineItem>,
    #[serde(default)]
    version: u64,
}

impl Basket {
    pub fn new(id: BasketId, currency: Currency) -> Self {
        Self {
            id,
            currency,
            frozen: FrozenValue::default(),
            is_successful: None,
            completed_at: None,
            response_data: None,
            deleted_at: None,
            items: Vec::new(),
            version: 0,
        }
    }

    pub fn id(&self) -> BasketId {
        self.id
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn item(&self, id: ItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Mutable access to an item. The item itself rejects changes once frozen.
    pub fn item_mut(&mut self, id: ItemId) -> Result<&mut LineItem> {
        self.items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or(TransferError::UnknownItem(id))
    }

    pub fn add_item(&mut self, mut item: LineItem) -> Result<()> {
        self.ensure_mutable()?;
        if self.item(item.id()).is_some() {
            return Err(TransferError::Validation(format!(
                "Item {} is already in basket {}",
                item.id(),
                self.id
            )));
        }
        item.attach(self.id);
        self.items.push(item);
        Ok(())
    }

    pub fn remove_item(&mut self, id: ItemId) -> Result<LineItem> {
        self.ensure_mutable()?;
        let index = self
            .items
            .iter()
            .position(|item| item.id() == id)
            .ok_or(TransferError::UnknownItem(id))?;
        Ok(self.items.remove(index))
    }

    /// Current total: the frozen amount, or the live sum of the items.
    pub fn value(&self, prices: &impl PriceLookup) -> Result<Money> {
        match self.frozen_amount() {
            Some(money) => Ok(money),
            None => compute_value(
                self.currency,
                self.items
                    .iter()
                    .map(|item| item.value(self.currency, prices)),
            ),
        }
    }

    pub fn frozen_amount(&self) -> Option<Money> {
        self.frozen
            .value()
            .map(|amount| Money::new(amount, self.currency))
    }

    /// Fixes the basket value and every item value.
    ///
    /// All prices are resolved before anything changes, so a failed lookup
    /// leaves the basket untouched. Returns `false` if it was already frozen.
    pub fn freeze(&mut self, prices: &impl PriceLookup) -> Result<bool> {
        if self.is_frozen() {
            return Ok(false);
        }

        let unit_values = self
            .items
            .iter()
            .map(|item| item.unit_value(self.currency, prices))
            .collect::<Result<Vec<_>>>()?;
        let total = compute_value(
            self.currency,
            self.items
                .iter()
                .zip(&unit_values)
                .map(|(item, unit)| unit.times(item.quantity())),
        )?;

        for (item, unit) in self.items.iter_mut().zip(unit_values) {
            item.freeze(unit.amount);
        }
        self.frozen.freeze(total.amount);

        debug!(basket = %self.id, value = %total, "basket frozen");
        Ok(true)
    }

    pub fn transfer_parameters(&self) -> Result<TransferParameters> {
        let money = self.frozen_amount().ok_or(TransferError::NotFrozen)?;
        Ok(TransferParameters {
            amount: money.to_major(),
            currency: money.currency,
        })
    }

    /// `amount`, `currency` and `transactionReference`, shallow-merged with `extra`.
    ///
    /// Keys present in `extra` take precedence.
    pub fn request_parameters(&self, extra: RequestParameters) -> Result<RequestParameters> {
        let transfer = self.transfer_parameters()?;
        let params = RequestParameters::new()
            .with("amount", transfer.amount.to_string())
            .with("currency", transfer.currency.code())
            .with("transactionReference", self.id.0);
        Ok(params.merge(extra))
    }

    /// Records an intermediate (redirect) response.
    pub fn record_redirect(&mut self, data: ResponseData) -> Result<()> {
        self.ensure_open()?;
        self.response_data = Some(data);
        Ok(())
    }

    /// Records the terminal response. Outcome and completion time are written once.
    pub fn record_terminal(
        &mut self,
        data: ResponseData,
        successful: bool,
        completed_at: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_open()?;
        self.response_data = Some(data);
        self.is_successful = Some(successful);
        self.completed_at = Some(completed_at);
        Ok(())
    }

    pub fn state(&self) -> TransferState {
        match (self.is_successful, &self.response_data) {
            (Some(true), _) => TransferState::Completed,
            (Some(false), _) => TransferState::Failed,
            (None, Some(_)) => TransferState::Pending,
            (None, None) => TransferState::Unsent,
        }
    }

    /// Whether any gateway response, redirect or terminal, has been recorded.
    pub fn is_sent(&self) -> bool {
        self.response_data.is_some()
    }

    pub fn is_successful(&self) -> Option<bool> {
        self.is_successful
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn response_data(&self) -> Option<&ResponseData> {
        self.response_data.as_ref()
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Logical deletion; the record and its history stay in storage.
    pub fn mark_deleted(&mut self, at: DateTime<Utc>) {
        if self.deleted_at.is_none() {
            self.deleted_at = Some(at);
        }
    }

    /// Optimistic-locking counter, bumped by the store on every save.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Domain validation run before a gateway call and before persisting.
    pub fn assert_valid(&self) -> Result<()> {
        if self.is_deleted() {
            return Err(TransferError::Validation(format!(
                "Basket {} is deleted",
                self.id
            )));
        }
        if self.items.is_empty() {
            return Err(TransferError::Validation(format!(
                "Basket {} has no items",
                self.id
            )));
        }
        if let Some(total) = self.frozen_amount() {
            if total.amount <= 0 {
                return Err(TransferError::Validation(format!(
                    "Basket {} has a non-positive value",
                    self.id
                )));
            }
            let items_total = compute_value(
                self.currency,
                self.items.iter().map(|item| match item.frozen_value().value() {
                    Some(unit) => Money::new(unit, self.currency).times(item.quantity()),
                    None => Err(TransferError::Validation(format!(
                        "Item {} is not frozen",
                        item.id()
                    ))),
                }),
            )?;
            if items_total != total {
                return Err(TransferError::Validation(format!(
                    "Basket {} value {} does not match its items ({})",
                    self.id, total, items_total
                )));
            }
        }
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state().is_terminal() {
            return Err(TransferError::Validation(format!(
                "Transfer for basket {} is already complete",
                self.id
            )));
        }
        Ok(())
    }
}

impl Freezable for Basket {
    const KIND: &'static str = "basket";

    fn frozen_value(&self) -> &FrozenValue {
        &self.frozen
    }
}
