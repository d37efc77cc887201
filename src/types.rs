//! Core types and IDs for the matching core.
//!
//! All identifiers are newtype wrappers. [`Order`], [`Side`], [`OrderType`], and
//! [`TimeInForce`] define the order model; [`Trade`] is the immutable match record.

use rust_decimal::Decimal;

/// Unique order identifier, assigned by the engine at submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct OrderId(pub u64);

/// Trade identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TradeId(pub u64);

/// Account that owns an order. Opaque to the core; used for self-trade prevention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct OwnerId(pub u64);

/// Trading symbol, e.g. "BTCUSDT".
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Symbol(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Order side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side a matching counterparty rests on.
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order type: limit (with price), market (take best available), or stop-limit
/// (parked until the stop price trades, then treated as a limit order).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OrderType {
    Limit,
    Market,
    StopLimit,
}

/// Time-in-force: how long the order stays active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TimeInForce {
    /// Good-Till-Cancel: rest on book until filled or cancelled.
    GTC,
    /// Immediate-or-Cancel: fill what you can immediately; cancel the rest.
    IOC,
    /// Fill-or-Kill: fill entirely immediately or reject with no trades.
    FOK,
}

/// Order lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OrderStatus {
    New,
    Open,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
    Expired,
}

impl OrderStatus {
    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled
                | OrderStatus::Cancelled
                | OrderStatus::Rejected
                | OrderStatus::Expired
        )
    }
}

/// Inbound order request, as handed over by the service boundary after
/// authentication and symbol routing. The engine assigns the order id and
/// arrival sequence.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    /// Required for limit and stop-limit, forbidden for market.
    pub price: Option<Decimal>,
    /// Required for stop-limit only.
    pub stop_price: Option<Decimal>,
    pub time_in_force: TimeInForce,
    pub owner: OwnerId,
    /// Caller-supplied tag, echoed back unmodified.
    pub client_order_id: Option<String>,
    /// Optional good-till-date deadline, swept by the expiry pass.
    pub expires_at: Option<u64>,
    /// Wall-clock submission time (display only; ordering uses the sequence).
    pub timestamp: u64,
}

/// An order tracked by the engine. Mutated only by the matching loop and the
/// lifecycle manager; callers see it through [`OrderView`].
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub client_order_id: Option<String>,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub remaining_quantity: Decimal,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub time_in_force: TimeInForce,
    pub status: OrderStatus,
    pub owner: OwnerId,
    pub expires_at: Option<u64>,
    /// Monotonic per-symbol arrival sequence; FIFO tie-break at equal price.
    pub sequence: u64,
    pub timestamp: u64,
}

impl Order {
    pub fn filled_quantity(&self) -> Decimal {
        self.quantity - self.remaining_quantity
    }

    /// Limit and stop-limit orders carry a limit price and may rest.
    pub fn is_limit(&self) -> bool {
        matches!(self.order_type, OrderType::Limit | OrderType::StopLimit)
    }

    pub fn is_market(&self) -> bool {
        matches!(self.order_type, OrderType::Market)
    }
}

/// Read-only snapshot of an order for external queries.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct OrderView {
    pub order_id: OrderId,
    pub client_order_id: Option<String>,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub filled_quantity: Decimal,
    pub remaining_quantity: Decimal,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub time_in_force: TimeInForce,
    pub status: OrderStatus,
    pub timestamp: u64,
}

impl From<&Order> for OrderView {
    fn from(o: &Order) -> Self {
        OrderView {
            order_id: o.order_id,
            client_order_id: o.client_order_id.clone(),
            symbol: o.symbol.clone(),
            side: o.side,
            order_type: o.order_type,
            quantity: o.quantity,
            filled_quantity: o.filled_quantity(),
            remaining_quantity: o.remaining_quantity,
            price: o.price,
            stop_price: o.stop_price,
            time_in_force: o.time_in_force,
            status: o.status,
            timestamp: o.timestamp,
        }
    }
}

/// Immutable record of one match. Created exactly once per fill, never mutated.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub symbol: Symbol,
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
    pub price: Decimal,
    pub quantity: Decimal,
    /// price * quantity, rounded to the symbol's quote precision.
    pub notional: Decimal,
    /// Side of the resting (maker) order.
    pub maker_side: Side,
    pub timestamp: u64,
    /// Per-symbol emission sequence; strictly increasing across submits.
    pub sequence: u64,
}
