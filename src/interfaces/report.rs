use crate::domain::basket::{Basket, TransferState};
use crate::domain::freeze::Freezable;
use crate::domain::payload::ResponseData;
use crate::error::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemReport {
    pub id: u64,
    pub product_id: u64,
    pub quantity: u32,
    pub is_frozen: bool,
    pub unit_value: Option<Decimal>,
}

/// Read-only view of a basket as printed by the command line tool.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasketReport {
    pub id: u64,
    pub currency: String,
    pub value: Option<Decimal>,
    pub is_frozen: bool,
    pub state: &'static str,
    pub is_sent: bool,
    pub is_successful: Option<bool>,
    pub completed_at: Option<DateTime<Utc>>,
    pub response_data: Option<ResponseData>,
    pub items: Vec<ItemReport>,
}

impl From<&Basket> for BasketReport {
    fn from(basket: &Basket) -> Self {
        let scale = basket.currency().exponent();
        Self {
            id: basket.id().0,
            currency: basket.currency().to_string(),
            value: basket.frozen_amount().map(|money| money.to_major()),
            is_frozen: basket.is_frozen(),
            state: state_name(basket.state()),
            is_sent: basket.is_sent(),
            is_successful: basket.is_successful(),
            completed_at: basket.completed_at(),
            response_data: basket.response_data().cloned(),
            items: basket
                .items()
                .iter()
                .map(|item| ItemReport {
                    id: item.id().0,
                    product_id: item.product_id().0,
                    quantity: item.quantity(),
                    is_frozen: item.is_frozen(),
                    unit_value: item
                        .frozen_value()
                        .value()
                        .map(|unit| Decimal::new(unit, scale)),
                })
                .collect(),
        }
    }
}

fn state_name(state: TransferState) -> &'static str {
    match state {
        TransferState::Unsent => "unsent",
        TransferState::Pending => "pending",
        TransferState::Completed => "completed",
        TransferState::Failed => "failed",
    }
}

/// Writes the report as pretty-printed JSON followed by a newline.
pub fn write_report<W: Write>(mut writer: W, basket: &Basket) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, &BasketReport::from(basket))?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::basket::BasketId;
    use crate::domain::item::{ItemId, LineItem, PriceList, ProductId};
    use crate::domain::money::{Currency, Money};

    #[test]
    fn test_report_of_completed_basket() {
        let gbp = Currency::new("GBP").unwrap();
        let mut basket = Basket::new(BasketId(1), gbp);
        basket
            .add_item(LineItem::new(ItemId(1), ProductId(1), 2).unwrap())
            .unwrap();
        basket
            .freeze(&PriceList::new().with(ProductId(1), Money::new(10000, gbp)))
            .unwrap();
        basket
            .record_terminal(ResponseData::new().with("success", true), true, Utc::now())
            .unwrap();

        let mut out = Vec::new();
        write_report(&mut out, &basket).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(json["state"], "completed");
        assert_eq!(json["value"], "200.00");
        assert_eq!(json["isSuccessful"], true);
        assert_eq!(json["responseData"]["success"], true);
        assert_eq!(json["items"][0]["unitValue"], "100.00");
    }
}
