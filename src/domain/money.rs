use crate::error::{Result, TransferError};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An ISO-4217 currency code such as `GBP` or `JPY`.
///
/// Codes are normalised to upper case and must be exactly three ASCII letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency([u8; 3]);

/// Currencies that have no minor unit.
const ZERO_DECIMAL: &[&str] = &[
    "BIF", "CLP", "DJF", "GNF", "ISK", "JPY", "KMF", "KRW", "PYG", "RWF", "UGX", "VND", "VUV",
    "XAF", "XOF", "XPF",
];

/// Currencies with three decimal places.
const THREE_DECIMAL: &[&str] = &["BHD", "IQD", "JOD", "KWD", "LYD", "OMR", "TND"];

impl Currency {
    pub fn new(code: &str) -> Result<Self> {
        let bytes = code.trim().as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(TransferError::Validation(format!(
                "Invalid currency code: {code:?}"
            )));
        }
        let mut normalised = [0u8; 3];
        for (slot, byte) in normalised.iter_mut().zip(bytes) {
            *slot = byte.to_ascii_uppercase();
        }
        Ok(Self(normalised))
    }

    pub fn code(&self) -> &str {
        // Only ASCII letters are ever stored.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }

    /// Number of decimal places between the minor and the major unit.
    pub fn exponent(&self) -> u32 {
        let code = self.code();
        if ZERO_DECIMAL.contains(&code) {
            0
        } else if THREE_DECIMAL.contains(&code) {
            3
        } else {
            2
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self(*b"GBP")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = TransferError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.code().to_string()
    }
}

/// A monetary value in the minor unit of its currency (pence, cents, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: i64,
    pub currency: Currency,
}

impl Money {
    pub fn new(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    /// Converts the minor-unit amount to the decimal representation gateways expect.
    ///
    /// The result always carries the currency's full scale, so `8000` GBP becomes `80.00`.
    pub fn to_major(&self) -> Decimal {
        Decimal::new(self.amount, self.currency.exponent())
    }

    /// Builds a value from a major-unit decimal such as `12.50`.
    ///
    /// Amounts finer than the currency's minor unit are rejected rather than rounded.
    pub fn from_major(amount: Decimal, currency: Currency) -> Result<Self> {
        let minor = amount
            .checked_mul(Decimal::from(10i64.pow(currency.exponent())))
            .ok_or_else(|| TransferError::Validation(format!("{amount} is out of range")))?;
        if !minor.fract().is_zero() {
            return Err(TransferError::Validation(format!(
                "{amount} has more precision than {currency} allows"
            )));
        }
        minor
            .to_i64()
            .map(|amount| Self::new(amount, currency))
            .ok_or_else(|| TransferError::Validation(format!("{amount} is out of range")))
    }

    /// Multiplies by a quantity, failing on overflow instead of wrapping.
    pub fn times(&self, quantity: u32) -> Result<Self> {
        self.amount
            .checked_mul(i64::from(quantity))
            .map(|amount| Self::new(amount, self.currency))
            .ok_or_else(|| TransferError::Validation("Monetary value overflow".to_string()))
    }

    pub fn checked_add(&self, other: &Money) -> Result<Self> {
        if self.currency != other.currency {
            return Err(TransferError::CurrencyMismatch {
                expected: self.currency,
                found: other.currency,
            });
        }
        self.amount
            .checked_add(other.amount)
            .map(|amount| Self::new(amount, self.currency))
            .ok_or_else(|| TransferError::Validation("Monetary value overflow".to_string()))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_major(), self.currency)
    }
}

/// Sums the contributions of a set of priced items into one aggregate value.
///
/// Every contribution must be in `currency`; a mismatch is a configuration error
/// and is reported immediately.
pub fn compute_value<I>(currency: Currency, contributions: I) -> Result<Money>
where
    I: IntoIterator<Item = Result<Money>>,
{
    contributions
        .into_iter()
        .try_fold(Money::zero(currency), |total, contribution| {
            total.checked_add(&contribution?)
        })
}
