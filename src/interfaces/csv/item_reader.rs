use crate::domain::item::{ItemId, LineItem, ProductId};
use crate::error::{Result, TransferError};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct ItemRecord {
    item: u64,
    product: u64,
    quantity: u32,
}

/// Reads basket line items from a CSV source with `item, product, quantity` columns.
pub struct ItemReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ItemReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads line items.
    pub fn items(self) -> impl Iterator<Item = Result<LineItem>> {
        self.reader.into_deserialize().map(|result| {
            let record: ItemRecord = result.map_err(TransferError::from)?;
            LineItem::new(
                ItemId(record.item),
                ProductId(record.product),
                record.quantity,
            )
        })
    }
}
