use crate::domain::item::ProductId;
use crate::domain::money::{Currency, Money};
use crate::error::{Result, TransferError};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct PriceRecord {
    product: u64,
    currency: String,
    price: Decimal,
}

/// Reads product prices from a CSV source with `product, currency, price` columns.
///
/// Prices are given in major units (`12.50`) and converted to minor units.
pub struct CatalogReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CatalogReader<R> {
    /// Creates a new `CatalogReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and converts price rows.
    pub fn prices(self) -> impl Iterator<Item = Result<(ProductId, Money)>> {
        self.reader.into_deserialize().map(|result| {
            let record: PriceRecord = result.map_err(TransferError::from)?;
            let currency = Currency::new(&record.currency)?;
            let price = Money::from_major(record.price, currency)?;
            if price.amount < 0 {
                return Err(TransferError::Validation(format!(
                    "Product {} has a negative price",
                    record.product
                )));
            }
            Ok((ProductId(record.product), price))
        })
    }
}
