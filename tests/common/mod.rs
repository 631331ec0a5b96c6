#![allow(dead_code)]

use std::io::Error;
use std::path::Path;
use tempfile::NamedTempFile;

/// Catalog with product 1 at 100.00 GBP and product 2 at 200.00 GBP.
pub const CATALOG: &[[&str; 3]] = &[["1", "GBP", "100.00"], ["2", "GBP", "200.00"]];

/// Two units of product 1 and four of product 2: 1000.00 GBP in total.
pub const ITEMS: &[[&str; 3]] = &[["1", "1", "2"], ["2", "2", "4"]];

pub const APPROVED_CARD: &str = "4242424242424242";
pub const DECLINED_CARD: &str = "4111111111111111";

pub fn write_csv(path: &Path, header: [&str; 3], rows: &[[&str; 3]]) -> Result<(), Error> {
    let mut wtr = csv::WriterBuilder::new().from_path(path)?;
    wtr.write_record(header)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn catalog_file(rows: &[[&str; 3]]) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    write_csv(file.path(), ["product", "currency", "price"], rows).unwrap();
    file
}

pub fn items_file(rows: &[[&str; 3]]) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    write_csv(file.path(), ["item", "product", "quantity"], rows).unwrap();
    file
}
