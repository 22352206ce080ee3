use rust_decimal::Decimal;
use uuid::Uuid;

/// An immutable trade event produced when an incoming order crosses a
/// resting one. Referenced symmetrically by both participating orders and
/// never mutated after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    /// Units traded. Always strictly positive — a no-op fill is never
    /// constructed.
    pub quantity: Decimal,
    /// The tick price the trade executed at: the resting (maker) order's
    /// price.
    pub price_ticks: i64,
    pub buy_id: Uuid,
    pub sell_id: Uuid,
    /// Stamped when the fill is created, not inherited from any default.
    pub timestamp: u128,
}
