mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use common::{APPROVED_CARD, CATALOG, ITEMS, catalog_file, items_file};
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_invalid_card_is_rejected_before_sending() {
    let catalog = catalog_file(CATALOG);
    let items = items_file(ITEMS);

    let mut cmd = Command::new(cargo_bin!("basket-transfer"));
    cmd.arg(items.path())
        .arg("--catalog")
        .arg(catalog.path())
        .arg("--card-number")
        .arg("1234567890123456");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Card number is invalid"))
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_unknown_product_fails_freeze() {
    let catalog = catalog_file(CATALOG);
    let items = items_file(&[["1", "1", "2"], ["2", "99", "1"]]);

    let mut cmd = Command::new(cargo_bin!("basket-transfer"));
    cmd.arg(items.path())
        .arg("--catalog")
        .arg(catalog.path())
        .arg("--card-number")
        .arg(APPROVED_CARD);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Unknown product: 99"));
}

#[test]
fn test_catalog_currency_mismatch() {
    let catalog = catalog_file(&[["1", "EUR", "100.00"], ["2", "GBP", "200.00"]]);
    let items = items_file(ITEMS);

    let mut cmd = Command::new(cargo_bin!("basket-transfer"));
    cmd.arg(items.path())
        .arg("--catalog")
        .arg(catalog.path())
        .arg("--card-number")
        .arg(APPROVED_CARD);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Currency mismatch"));
}

#[test]
fn test_zero_quantity_is_rejected() {
    let catalog = catalog_file(CATALOG);
    let items = items_file(&[["1", "1", "0"]]);

    let mut cmd = Command::new(cargo_bin!("basket-transfer"));
    cmd.arg(items.path())
        .arg("--catalog")
        .arg(catalog.path())
        .arg("--card-number")
        .arg(APPROVED_CARD);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Quantity must be positive"));
}
