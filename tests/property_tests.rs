use basket_transfer::domain::basket::{Basket, BasketId};
use basket_transfer::domain::freeze::Freezable;
use basket_transfer::domain::item::{ItemId, LineItem, PriceList, ProductId};
use basket_transfer::domain::money::{Currency, Money};
use basket_transfer::domain::payload::ResponseData;
use proptest::prelude::*;
use serde_json::Value;

const PRODUCTS: u64 = 5;

fn gbp() -> Currency {
    Currency::new("GBP").unwrap()
}

fn price_list(prices: &[i64]) -> PriceList {
    prices
        .iter()
        .enumerate()
        .fold(PriceList::new(), |list, (index, &price)| {
            list.with(ProductId(index as u64), Money::new(price, gbp()))
        })
}

#[derive(Debug, Clone)]
enum Op {
    Add { product: u64, quantity: u32 },
    Remove { index: usize },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..PRODUCTS, 1u32..50).prop_map(|(product, quantity)| Op::Add { product, quantity }),
        (0usize..20).prop_map(|index| Op::Remove { index }),
    ]
}

fn build(ops: &[Op]) -> Basket {
    let mut basket = Basket::new(BasketId(1), gbp());
    for (next_id, op) in ops.iter().enumerate() {
        match op {
            Op::Add { product, quantity } => {
                let item = LineItem::new(ItemId(next_id as u64), ProductId(*product), *quantity)
                    .unwrap();
                basket.add_item(item).unwrap();
            }
            Op::Remove { index } => {
                if let Some(id) = basket.items().get(*index).map(|item| item.id()) {
                    basket.remove_item(id).unwrap();
                }
            }
        }
    }
    basket
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        ".*".prop_map(Value::from),
    ]
}

proptest! {
    #[test]
    fn value_is_sum_of_items(
        prices in prop::collection::vec(0i64..1_000_000, PRODUCTS as usize),
        ops in prop::collection::vec(op(), 0..30),
    ) {
        let prices = price_list(&prices);
        let basket = build(&ops);

        let expected: i64 = basket
            .items()
            .iter()
            .map(|item| item.value(gbp(), &prices).unwrap().amount)
            .sum();
        prop_assert_eq!(basket.value(&prices).unwrap().amount, expected);
    }

    #[test]
    fn freeze_is_idempotent_and_final(
        prices in prop::collection::vec(0i64..1_000_000, PRODUCTS as usize),
        repriced in prop::collection::vec(0i64..1_000_000, PRODUCTS as usize),
        ops in prop::collection::vec(op(), 1..30),
    ) {
        let prices = price_list(&prices);
        let repriced = price_list(&repriced);
        let mut once = build(&ops);
        let before = once.value(&prices).unwrap();

        once.freeze(&prices).unwrap();
        let mut twice = once.clone();
        twice.freeze(&repriced).unwrap();

        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(twice.value(&repriced).unwrap(), before);
        prop_assert!(twice.items().iter().all(|item| item.is_frozen()));
        for item in twice.items() {
            prop_assert_eq!(
                item.value(gbp(), &repriced).unwrap(),
                item.value(gbp(), &prices).unwrap()
            );
        }
    }

    #[test]
    fn response_data_round_trips(
        entries in prop::collection::vec(("[a-zA-Z_]{1,12}", scalar()), 0..12),
    ) {
        let data: ResponseData = entries.into_iter().collect();
        let text = data.to_json().unwrap();
        let parsed = ResponseData::from_json(&text).unwrap();

        prop_assert_eq!(&parsed, &data);
        prop_assert_eq!(parsed.to_json().unwrap(), text);
    }

    #[test]
    fn major_units_round_trip(amount in -1_000_000_000i64..1_000_000_000) {
        let money = Money::new(amount, gbp());
        prop_assert_eq!(Money::from_major(money.to_major(), gbp()).unwrap(), money);
    }
}
