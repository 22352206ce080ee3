use thiserror::Error;

/// Errors that can occur while constructing or submitting an order.
///
/// Construction failures (`InvalidPrice`, `InvalidQuantity`) are fatal for
/// that call and never mutate book state. `TickMisaligned` is only ever
/// returned by [`crate::book::OrderBook::try_add`] — the default
/// [`crate::book::OrderBook::add`] silently discards misaligned orders to
/// match the source's historical contract.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBookError {
    #[error("price must be greater than zero")]
    InvalidPrice,
    #[error("quantity must be greater than zero")]
    InvalidQuantity,
    #[error("price is not an exact multiple of the book's tick size")]
    TickMisaligned,
}
