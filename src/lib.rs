//! `order_book_engine` — an in-process limit order book matching engine for
//! a single trading instrument.
//!
//! The engine enforces price–time priority across two price-indexed
//! orderings (bids descending, asks ascending), matches incoming orders
//! against resting liquidity, emits [`fill::Fill`] records, and rests any
//! unfilled residue. See `SPEC_FULL.md` at the repository root for the full
//! contract; this crate implements it module-for-module:
//!
//! - [`order`] — the [`order::Order`] entity, its [`order::Side`] and
//!   [`order::OrderStatus`] variants, and the maker-price crossing rule.
//! - [`fill`] — the immutable [`fill::Fill`] trade record.
//! - [`price`] — decimal ⇄ integer tick conversion.
//! - [`book`] — [`book::OrderBook`], the matching engine and price-level
//!   index.
//! - [`error`] — [`error::OrderBookError`].
//!
//! ```
//! use order_book_engine::{OrderBook, Side};
//! use rust_decimal_macros::dec;
//!
//! let mut book = OrderBook::new(dec!(0.01), None);
//! let resting = book.create_order(Side::Buy, dec!(10.00), dec!(5)).unwrap();
//! book.add(resting);
//!
//! let incoming = book.create_order(Side::Sell, dec!(10.00), dec!(2)).unwrap();
//! let fills = book.add(incoming);
//! assert_eq!(fills.len(), 1);
//! assert_eq!(book.buy_volume(), dec!(3));
//! ```

pub mod book;
pub mod error;
pub mod fill;
pub mod order;
pub mod price;

pub use book::{OrderBook, OrderBookConfig, OrderId};
pub use error::OrderBookError;
pub use fill::Fill;
pub use order::{Order, OrderStatus, Side};
