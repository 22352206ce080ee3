use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::OrderBookError;
use crate::fill::Fill;

/// Which side of the book an order rests on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

/// Lifecycle state of an [`Order`]. `Open` is the only non-terminal state;
/// once an order leaves it (`Filled` or `Canceled`) it never returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Open,
    Filled,
    Canceled,
}

/// A resting or in-flight limit order.
///
/// Constructed exclusively through [`crate::book::OrderBook::create_order`]
/// so the tick snap happens in one place. Once submitted via
/// [`crate::book::OrderBook::add`], its `quantity` and `status` are mutated
/// only by the book's matching loop or by [`crate::book::OrderBook::cancel`].
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub side: Side,
    pub price_ticks: i64,
    pub quantity: Decimal,
    pub timestamp: u128,
    pub status: OrderStatus,
    pub fills: Vec<Fill>,
    /// Whether the decimal price this order was created from was an exact
    /// multiple of the book's tick size at creation time. Tick misalignment
    /// is not a construction failure (`SPEC_FULL.md` §4.4.2) — it surfaces
    /// later, when the order is submitted via `add`.
    pub(crate) tick_aligned: bool,
}

impl Order {
    pub(crate) fn new(
        side: Side,
        price_ticks: i64,
        quantity: Decimal,
        timestamp: u128,
        tick_aligned: bool,
    ) -> Result<Self, OrderBookError> {
        if quantity <= Decimal::ZERO {
            return Err(OrderBookError::InvalidQuantity);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            side,
            price_ticks,
            quantity,
            timestamp,
            status: OrderStatus::Open,
            fills: Vec::new(),
            tick_aligned,
        })
    }

    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }

    /// `price × quantity` at the order's current (possibly partially
    /// filled) quantity, expressed against `tick_size`.
    pub fn size(&self, tick_size: Decimal) -> Decimal {
        crate::price::ticks_to_decimal(self.price_ticks, tick_size) * self.quantity
    }

    /// Transitions `Open` → `Canceled`. Calling this on a non-`Open` order
    /// is a caller bug; the book only ever calls it on orders it has just
    /// found resting, so it never has to guard the transition itself.
    pub(crate) fn cancel(&mut self) {
        debug_assert!(self.is_open(), "cancel() called on a non-open order");
        self.status = OrderStatus::Canceled;
    }

    /// True iff `self` and `other` are on opposite sides and their prices
    /// cross (a resting Buy at or above a resting Sell).
    pub fn can_match(&self, other: &Order) -> bool {
        if self.side == other.side {
            return false;
        }
        match self.side {
            Side::Buy => self.price_ticks >= other.price_ticks,
            Side::Sell => self.price_ticks <= other.price_ticks,
        }
    }

    /// Crosses `self` (the resting maker) against `counter` (the incoming
    /// taker), filling `min(self.quantity, counter.quantity)` at `self`'s
    /// price. Returns `None` without mutating either order if they don't
    /// actually cross.
    pub(crate) fn apply_fill(&mut self, counter: &mut Order, timestamp: u128) -> Option<Fill> {
        if !self.can_match(counter) {
            return None;
        }

        let quantity = self.quantity.min(counter.quantity);
        self.quantity -= quantity;
        counter.quantity -= quantity;

        if self.quantity.is_zero() {
            self.status = OrderStatus::Filled;
        }
        if counter.quantity.is_zero() {
            counter.status = OrderStatus::Filled;
        }

        let (buy_id, sell_id) = match self.side {
            Side::Buy => (self.id, counter.id),
            Side::Sell => (counter.id, self.id),
        };

        let fill = Fill {
            quantity,
            price_ticks: self.price_ticks,
            buy_id,
            sell_id,
            timestamp,
        };
        self.fills.push(fill);
        counter.fills.push(fill);
        Some(fill)
    }
}
