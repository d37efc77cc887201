//! # Matchbook
//!
//! In-process limit order book and price-time priority matching core for one
//! trading symbol: order book, matching step, order lifecycle, and outbound
//! trade/status events.
//!
//! ## Entry point
//!
//! Use [`Engine`] as the single entry point for one symbol: create with
//! [`Engine::new`] (or [`Engine::with_sink`] to receive events), then
//! [`Engine::submit_order`], [`Engine::cancel_order`], and
//! [`Engine::expire_gtd_orders`]. [`MultiEngine`] routes across symbols, one
//! single-writer critical section per symbol.
//!
//! ## Example
//!
//! ```rust
//! use matchbook::{
//!     Engine, OrderRequest, OrderStatus, OrderType, OwnerId, Side, Symbol, SymbolConfig,
//!     TimeInForce,
//! };
//! use rust_decimal::Decimal;
//!
//! let config = SymbolConfig {
//!     symbol: Symbol::new("BTCUSDT"),
//!     tick_size: "0.01".parse().unwrap(),
//!     lot_size: "0.0001".parse().unwrap(),
//!     min_quantity: "0.0001".parse().unwrap(),
//!     max_quantity: Decimal::from(1000),
//!     min_price: "0.01".parse().unwrap(),
//!     max_price: Decimal::from(1_000_000),
//!     quote_precision: 2,
//! };
//! let mut engine = Engine::new(config);
//! let ack = engine
//!     .submit_order(OrderRequest {
//!         symbol: Symbol::new("BTCUSDT"),
//!         side: Side::Sell,
//!         order_type: OrderType::Limit,
//!         quantity: Decimal::ONE,
//!         price: Some(Decimal::from(50_000)),
//!         stop_price: None,
//!         time_in_force: TimeInForce::GTC,
//!         owner: OwnerId(1),
//!         client_order_id: None,
//!         expires_at: None,
//!         timestamp: 1,
//!     })
//!     .unwrap();
//! assert_eq!(ack.status, OrderStatus::Open);
//! assert!(ack.trades.is_empty());
//! ```
//!
//! ## Lower-level API
//!
//! [`OrderBook`] and [`match_order`] are exposed for embedders that manage
//! order storage and event emission themselves.

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod matching;
pub mod order_book;
pub mod order_gen;
pub mod price_level;
pub mod types;

pub use config::SymbolConfig;
pub use engine::{CancelResult, Depth, Engine, MultiEngine, OrderAcceptance};
pub use error::{CancelError, EngineError, RejectReason};
pub use events::{EventSink, InMemoryEventSink, NullEventSink, OrderStatusChanged, StdoutEventSink};
pub use matching::{match_order, MatchOutcome};
pub use order_book::{Fill, OrderBook};
pub use order_gen::{FlowConfig, OrderFlow};
pub use price_level::{LevelEntry, PriceLevel};
pub use types::{
    Order, OrderId, OrderRequest, OrderStatus, OrderType, OrderView, OwnerId, Side, Symbol,
    TimeInForce, Trade, TradeId,
};
