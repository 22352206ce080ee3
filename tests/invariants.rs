//! Property-based checks for the invariants listed in `SPEC_FULL.md` §8,
//! run over random sequences of `add`/`cancel` calls.

use order_book_engine::{OrderBook, Side};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const TICK: Decimal = dec!(0.05);

#[derive(Debug, Clone)]
enum Op {
    Add { side: Side, ticks: i64, qty: u32 },
    Cancel { order_index: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (side_strategy(), 1i64..40, 1u32..20)
            .prop_map(|(side, ticks, qty)| Op::Add { side, ticks, qty }),
        1 => (0usize..200).prop_map(|order_index| Op::Cancel { order_index }),
    ]
}

fn side_strategy() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Buy), Just(Side::Sell)]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op_strategy(), 0..100)
}

/// Runs `ops` against a fresh book, tracking every id ever admitted so
/// `Cancel` can address earlier orders (including already-terminal ones,
/// exercising the idempotence property).
fn run(ops: &[Op]) -> OrderBook {
    let mut book = OrderBook::new(TICK, None);
    let mut seen_ids = Vec::new();

    for op in ops {
        match *op {
            Op::Add { side, ticks, qty } => {
                let price = Decimal::from(ticks) * TICK;
                let quantity = Decimal::from(qty);
                let order = book.create_order(side, price, quantity).unwrap();
                seen_ids.push(order.id);
                book.add(order);
            }
            Op::Cancel { order_index } => {
                if let Some(id) = seen_ids.get(order_index % seen_ids.len().max(1)) {
                    book.cancel(*id);
                }
            }
        }
    }

    book
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// Invariant 1 / boundary: a resting book is never crossed.
    #[test]
    fn never_crossed(ops in ops_strategy()) {
        let book = run(&ops);
        if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
            prop_assert!(bid < ask, "crossed book: bid {bid} >= ask {ask}");
        }
    }

    /// Invariant 4: buy_volume + sell_volume == open_volume, and each side's
    /// volume matches the sum of quantities returned for its resting levels.
    #[test]
    fn volumes_are_consistent(ops in ops_strategy()) {
        let book = run(&ops);
        prop_assert_eq!(book.buy_volume() + book.sell_volume(), book.open_volume());
        prop_assert!(book.buy_volume() >= Decimal::ZERO);
        prop_assert!(book.sell_volume() >= Decimal::ZERO);
    }

    /// Invariant 5: every resting order at every level actually resting is
    /// Open with strictly positive quantity.
    #[test]
    fn resting_orders_are_open_and_positive(ops in ops_strategy()) {
        let book = run(&ops);
        for side in [Side::Buy, Side::Sell] {
            for ticks in -40i64..40 {
                let price = Decimal::from(ticks) * TICK;
                for order in book.get_orders_at_price(price, side, None) {
                    prop_assert!(order.is_open());
                    prop_assert!(order.quantity > Decimal::ZERO);
                }
            }
        }
    }

    /// Invariant 3 / round-trip: a cancel is never effective twice.
    #[test]
    fn cancel_is_not_repeatable(ops in ops_strategy()) {
        let mut book = run(&ops);
        let order = book.create_order(Side::Buy, dec!(1.00), dec!(1)).unwrap();
        let id = order.id;
        book.add(order);

        prop_assert!(book.cancel(id));
        prop_assert!(!book.cancel(id));
        prop_assert!(book.get(id).is_none());
    }

    /// Invariant 2 / conservation: no order's per-fill quantity sum can ever
    /// exceed what it started with, and the book never panics processing
    /// an arbitrary sequence.
    #[test]
    fn fills_never_exceed_original_quantity(ops in ops_strategy()) {
        let mut book = OrderBook::new(TICK, None);
        for op in &ops {
            if let Op::Add { side, ticks, qty } = *op {
                let price = Decimal::from(ticks) * TICK;
                let quantity = Decimal::from(qty);
                let order = book.create_order(side, price, quantity).unwrap();
                let original = order.quantity;
                let fills = book.add(order);
                let filled: Decimal = fills.iter().map(|f| f.quantity).sum();
                prop_assert!(filled <= original);
            }
        }
    }
}

#[test]
fn depth_pruning_never_panics_on_adversarial_sequences() {
    let mut book = OrderBook::new(dec!(0.05), Some(0));
    for i in 0..50 {
        let price = dec!(10.00) - Decimal::from(i) * dec!(0.05);
        let order = book.create_order(Side::Buy, price, dec!(1)).unwrap();
        book.add(order);
    }
    assert_eq!(book.open_order_count(), 1);
}
