use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::error::OrderBookError;
use crate::fill::Fill;
use crate::order::{Order, OrderStatus, Side};
use crate::price::{decimal_to_ticks, ticks_to_decimal};

/// Fixed configuration for an [`OrderBook`] — the tick size and optional
/// bounded-depth window. Both are set once at construction and never
/// change over the book's lifetime (`SPEC_FULL.md` §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBookConfig {
    /// Smallest price increment. All accepted prices must be an exact
    /// multiple of this.
    pub tick_size: Decimal,
    /// Optional window, in ticks, outside of which resting orders are
    /// pruned after every `add`. `None` disables pruning.
    pub market_depth: Option<u64>,
}

impl Default for OrderBookConfig {
    fn default() -> Self {
        Self {
            tick_size: dec!(0.01),
            market_depth: None,
        }
    }
}

/// Lets [`OrderBook::cancel`] and [`OrderBook::get`] accept either a native
/// [`Uuid`] or its lowercase hex textual form, per the external interface
/// contract (`SPEC_FULL.md` §6).
pub trait OrderId {
    fn resolve(&self) -> Option<Uuid>;
}

impl OrderId for Uuid {
    fn resolve(&self) -> Option<Uuid> {
        Some(*self)
    }
}

impl OrderId for &str {
    fn resolve(&self) -> Option<Uuid> {
        Uuid::parse_str(self).ok()
    }
}

impl OrderId for String {
    fn resolve(&self) -> Option<Uuid> {
        Uuid::parse_str(self).ok()
    }
}

/// A price key usable on either side of the book: ascending for asks,
/// descending for bids. Implemented for `i64` (asks) and `Reverse<i64>`
/// (bids) so the crossing loop in [`cross_and_fill`] is written once.
trait PriceKey: Ord + Copy {
    fn ticks(self) -> i64;
    fn from_ticks(ticks: i64) -> Self;
}

impl PriceKey for i64 {
    fn ticks(self) -> i64 {
        self
    }
    fn from_ticks(ticks: i64) -> Self {
        ticks
    }
}

impl PriceKey for Reverse<i64> {
    fn ticks(self) -> i64 {
        self.0
    }
    fn from_ticks(ticks: i64) -> Self {
        Reverse(ticks)
    }
}

/// One side of the book: an ordered map from tick price to a FIFO queue of
/// resting orders. The "best" level is always `levels`'s first entry,
/// regardless of which concrete key type is used.
#[derive(Debug)]
struct Ladder<K: PriceKey> {
    levels: BTreeMap<K, VecDeque<Order>>,
}

impl<K: PriceKey> Default for Ladder<K> {
    fn default() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }
}

impl<K: PriceKey> Ladder<K> {
    fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    fn best_ticks(&self) -> Option<i64> {
        self.levels.keys().next().map(|k| k.ticks())
    }

    fn insert(&mut self, price_ticks: i64, order: Order) {
        self.levels
            .entry(K::from_ticks(price_ticks))
            .or_default()
            .push_back(order);
    }

    fn orders_at(&self, price_ticks: i64) -> Option<&VecDeque<Order>> {
        self.levels.get(&K::from_ticks(price_ticks))
    }

    fn remove_by_id(&mut self, price_ticks: i64, id: Uuid) -> Option<Order> {
        let key = K::from_ticks(price_ticks);
        let queue = self.levels.get_mut(&key)?;
        let pos = queue.iter().position(|o| o.id == id)?;
        let order = queue.remove(pos)?;
        if queue.is_empty() {
            self.levels.remove(&key);
        }
        Some(order)
    }

    fn total_quantity(&self) -> Decimal {
        self.levels
            .values()
            .flat_map(|queue| queue.iter())
            .map(|order| order.quantity)
            .sum()
    }

    fn order_count(&self) -> usize {
        self.levels.values().map(VecDeque::len).sum()
    }
}

/// Advances `clock` to a monotonically non-decreasing nanosecond instant
/// and returns it. Backs both `Order.timestamp` and `Fill.timestamp` so the
/// whole book shares one ordering clock (`SPEC_FULL.md` §9, fill timestamp).
fn monotonic_ns(clock: &mut u128) -> u128 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let ts = now.max(*clock + 1);
    *clock = ts;
    ts
}

/// Crosses `incoming` against the opposite-side `ladder` until either
/// `incoming` is no longer open or the book no longer crosses. Generic over
/// the ladder's key type so one implementation serves both sides.
fn cross_and_fill<K: PriceKey>(
    incoming: &mut Order,
    ladder: &mut Ladder<K>,
    open_orders: &mut HashMap<Uuid, (Side, i64)>,
    clock: &mut u128,
) -> Vec<Fill> {
    let mut fills = Vec::new();

    while incoming.is_open() {
        let Some(best) = ladder.best_ticks() else {
            break;
        };
        let crosses = match incoming.side {
            Side::Buy => incoming.price_ticks >= best,
            Side::Sell => incoming.price_ticks <= best,
        };
        if !crosses {
            break;
        }

        let key = K::from_ticks(best);
        let queue = ladder
            .levels
            .get_mut(&key)
            .expect("best level just observed must still exist");

        while incoming.is_open() {
            let Some(maker) = queue.front_mut() else {
                break;
            };
            let ts = monotonic_ns(clock);
            let Some(fill) = maker.apply_fill(incoming, ts) else {
                break;
            };
            trace!(?fill, "matched order");
            fills.push(fill);

            if maker.status == OrderStatus::Filled {
                let filled = queue.pop_front().expect("front() just matched");
                open_orders.remove(&filled.id);
            } else {
                // Incoming is exhausted; the partial maker stays at the head.
                break;
            }
        }

        if queue.is_empty() {
            ladder.levels.remove(&key);
        }
    }

    fills
}

/// A single-instrument limit order book enforcing price-time priority.
///
/// See `SPEC_FULL.md` for the full contract. All mutating methods
/// (`add`/`try_add`, `cancel`, `clear`) are atomic relative to each other
/// from the caller's perspective but are **not** internally synchronized —
/// a caller sharing one `OrderBook` across threads must serialize access
/// itself.
#[derive(Debug)]
pub struct OrderBook {
    config: OrderBookConfig,
    bids: Ladder<Reverse<i64>>,
    asks: Ladder<i64>,
    open_orders: HashMap<Uuid, (Side, i64)>,
    clock: u128,
}

impl OrderBook {
    /// Creates an empty book with the given tick size and optional depth
    /// window (`tick_size` default `0.01`, `market_depth` default `None`
    /// per `SPEC_FULL.md` §6).
    pub fn new(tick_size: Decimal, market_depth: Option<u64>) -> Self {
        Self::with_config(OrderBookConfig {
            tick_size,
            market_depth,
        })
    }

    pub fn with_config(config: OrderBookConfig) -> Self {
        Self {
            config,
            bids: Ladder::default(),
            asks: Ladder::default(),
            open_orders: HashMap::new(),
            clock: 0,
        }
    }

    pub fn config(&self) -> OrderBookConfig {
        self.config
    }

    /// Snaps `price` to ticks and constructs an `Order` without inserting
    /// it into the book. Fails with `InvalidPrice`/`InvalidQuantity` at
    /// construction; a tick-misaligned price is *not* a failure here — it
    /// surfaces later as a silent rejection from `add` (§4.4.1–4.4.2).
    pub fn create_order(
        &mut self,
        side: Side,
        price: Decimal,
        quantity: Decimal,
    ) -> Result<Order, OrderBookError> {
        if price <= Decimal::ZERO {
            return Err(OrderBookError::InvalidPrice);
        }
        if quantity <= Decimal::ZERO {
            return Err(OrderBookError::InvalidQuantity);
        }
        let (price_ticks, tick_aligned) = decimal_to_ticks(price, self.config.tick_size)
            .ok_or(OrderBookError::InvalidPrice)?;
        if price_ticks < 1 {
            // A positive price that rounds below one tick can't satisfy
            // the `price_ticks >= 1` invariant (SPEC_FULL.md §3, inv. 6).
            return Err(OrderBookError::InvalidPrice);
        }

        let timestamp = monotonic_ns(&mut self.clock);
        Order::new(side, price_ticks, quantity, timestamp, tick_aligned)
    }

    /// Matches `order` against resting liquidity, rests any residue, prunes
    /// depth, and returns the fills produced. Silently discards orders
    /// built from a tick-misaligned price (`[]`, no state mutated) — use
    /// [`Self::try_add`] for an explicit error instead.
    pub fn add(&mut self, order: Order) -> Vec<Fill> {
        if !order.tick_aligned {
            warn!(order_id = %order.id, "rejecting tick-misaligned order");
            return Vec::new();
        }
        self.match_and_rest(order)
    }

    /// Like [`Self::add`], but reports tick misalignment as
    /// `Err(OrderBookError::TickMisaligned)` instead of discarding silently.
    pub fn try_add(&mut self, order: Order) -> Result<Vec<Fill>, OrderBookError> {
        if !order.tick_aligned {
            return Err(OrderBookError::TickMisaligned);
        }
        Ok(self.match_and_rest(order))
    }

    fn match_and_rest(&mut self, mut order: Order) -> Vec<Fill> {
        debug!(order_id = %order.id, side = ?order.side, price_ticks = order.price_ticks, quantity = %order.quantity, "matching incoming order");

        let OrderBook {
            bids,
            asks,
            open_orders,
            clock,
            ..
        } = self;
        let fills = match order.side {
            Side::Buy => cross_and_fill(&mut order, asks, open_orders, clock),
            Side::Sell => cross_and_fill(&mut order, bids, open_orders, clock),
        };

        if order.is_open() {
            let id = order.id;
            let side = order.side;
            let price_ticks = order.price_ticks;
            match side {
                Side::Buy => self.bids.insert(price_ticks, order),
                Side::Sell => self.asks.insert(price_ticks, order),
            }
            self.open_orders.insert(id, (side, price_ticks));
        }

        self.enforce_market_depth();
        fills
    }

    /// Cancels a resting order. Returns `false` for an unknown id or one
    /// already in a terminal state; never panics.
    pub fn cancel(&mut self, id: impl OrderId) -> bool {
        let Some(id) = id.resolve() else {
            return false;
        };
        let Some((side, price_ticks)) = self.open_orders.remove(&id) else {
            return false;
        };

        let removed = match side {
            Side::Buy => self.bids.remove_by_id(price_ticks, id),
            Side::Sell => self.asks.remove_by_id(price_ticks, id),
        };

        match removed {
            Some(mut order) => {
                order.cancel();
                true
            }
            None => {
                debug_assert!(
                    false,
                    "id index pointed at {price_ticks} but the order wasn't queued there"
                );
                false
            }
        }
    }

    /// Returns a read-only snapshot of the order, or `None` if it isn't
    /// currently resting.
    pub fn get(&self, id: impl OrderId) -> Option<Order> {
        let id = id.resolve()?;
        let (side, price_ticks) = *self.open_orders.get(&id)?;
        let queue = match side {
            Side::Buy => self.bids.orders_at(price_ticks),
            Side::Sell => self.asks.orders_at(price_ticks),
        }?;
        queue.iter().find(|order| order.id == id).cloned()
    }

    /// Returns the first `k` (or all, if `k` is `None`) resting orders at
    /// `price` on `side`, or an empty vec if the level doesn't exist.
    pub fn get_orders_at_price(
        &self,
        price: Decimal,
        side: Side,
        k: Option<usize>,
    ) -> Vec<Order> {
        let Some((price_ticks, _)) = decimal_to_ticks(price, self.config.tick_size) else {
            return Vec::new();
        };
        let queue = match side {
            Side::Buy => self.bids.orders_at(price_ticks),
            Side::Sell => self.asks.orders_at(price_ticks),
        };
        match (queue, k) {
            (Some(queue), Some(k)) => queue.iter().take(k).cloned().collect(),
            (Some(queue), None) => queue.iter().cloned().collect(),
            (None, _) => Vec::new(),
        }
    }

    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids
            .best_ticks()
            .map(|ticks| ticks_to_decimal(ticks, self.config.tick_size))
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks
            .best_ticks()
            .map(|ticks| ticks_to_decimal(ticks, self.config.tick_size))
    }

    pub fn spread(&self) -> Option<Decimal> {
        Some(self.best_ask()? - self.best_bid()?)
    }

    pub fn buy_volume(&self) -> Decimal {
        self.bids.total_quantity()
    }

    pub fn sell_volume(&self) -> Decimal {
        self.asks.total_quantity()
    }

    pub fn open_volume(&self) -> Decimal {
        self.buy_volume() + self.sell_volume()
    }

    /// Number of resting orders across both sides. Not part of the
    /// required external surface; handy for tests and invariant checks.
    pub fn open_order_count(&self) -> usize {
        self.bids.order_count() + self.asks.order_count()
    }

    pub fn clear(&mut self) {
        self.bids.levels.clear();
        self.asks.levels.clear();
        self.open_orders.clear();
    }

    /// Evicts resting levels outside the configured depth window. Runs
    /// after every `add`/`try_add`, never mid-match. A no-op unless both
    /// `tick_size` (always set) and `market_depth` are configured.
    fn enforce_market_depth(&mut self) {
        let Some(depth) = self.config.market_depth else {
            return;
        };
        let depth = depth as i64;

        if let Some(best_bid) = self.bids.best_ticks() {
            let lower = best_bid.saturating_sub(depth);
            let evicted = self
                .bids
                .levels
                .split_off(&Reverse(lower.saturating_sub(1)));
            for (_, queue) in evicted {
                self.evict_level(queue);
            }
        }

        if let Some(best_ask) = self.asks.best_ticks() {
            let upper = best_ask.saturating_add(depth);
            let evicted = self.asks.levels.split_off(&upper.saturating_add(1));
            for (_, queue) in evicted {
                self.evict_level(queue);
            }
        }
    }

    /// Transitions every order in an evicted level to `Canceled`, drops it
    /// from the id index (§9, "status propagation on pruning"), and returns
    /// the now-`Canceled` orders (callers are free to ignore the result;
    /// `enforce_market_depth` does).
    fn evict_level(&mut self, queue: VecDeque<Order>) -> Vec<Order> {
        queue
            .into_iter()
            .map(|mut order| {
                order.cancel();
                self.open_orders.remove(&order.id);
                warn!(order_id = %order.id, price_ticks = order.price_ticks, "evicted by market depth pruning");
                order
            })
            .collect()
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::with_config(OrderBookConfig::default())
    }
}
