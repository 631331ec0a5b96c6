//! The freezable-value capability shared by baskets and their items.
//!
//! A value is recomputed from its inputs until it is frozen; after that the
//! stored amount is authoritative and nothing may change it.

use crate::error::{Result, TransferError};
use serde::{Deserialize, Serialize};

/// Persisted freeze state: a monotonic flag plus the amount fixed at freeze time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrozenValue {
    is_frozen: bool,
    value: i64,
}

impl FrozenValue {
    /// Restores a previously persisted state.
    pub fn restore(is_frozen: bool, value: i64) -> Self {
        Self { is_frozen, value }
    }

    pub fn is_frozen(&self) -> bool {
        self.is_frozen
    }

    /// The fixed amount, present only once frozen.
    pub fn value(&self) -> Option<i64> {
        self.is_frozen.then_some(self.value)
    }

    /// Fixes `value`. Returns `false` without touching anything if already frozen.
    pub fn freeze(&mut self, value: i64) -> bool {
        if self.is_frozen {
            return false;
        }
        self.value = value;
        self.is_frozen = true;
        true
    }
}

pub trait Freezable {
    /// Human readable kind, used in error messages.
    const KIND: &'static str;

    fn frozen_value(&self) -> &FrozenValue;

    fn is_frozen(&self) -> bool {
        self.frozen_value().is_frozen()
    }

    /// Fails with `FrozenState` when the entity can no longer be changed.
    fn ensure_mutable(&self) -> Result<()> {
        if self.is_frozen() {
            Err(TransferError::FrozenState(Self::KIND.to_string()))
        } else {
            Ok(())
        }
    }
}
