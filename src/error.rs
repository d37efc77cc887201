//! Error taxonomy: recoverable rejections vs. fatal invariant violations.
//!
//! Validation and business-rule failures are returned as typed results inside
//! [`crate::engine::OrderAcceptance`] / [`crate::engine::CancelResult`]; only
//! [`EngineError`] variants escalate as `Err` and halt the symbol's book.

use crate::types::{OrderId, OrderStatus, Symbol};
use rust_decimal::Decimal;

/// Reason an order was rejected before or during matching. No book state is
/// mutated when one of these is returned.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum RejectReason {
    #[error("symbol {0} is unknown or inactive")]
    UnknownSymbol(Symbol),
    #[error("order symbol {order} does not match engine symbol {engine}")]
    SymbolMismatch { order: Symbol, engine: Symbol },
    #[error("limit order requires a price")]
    PriceRequired,
    #[error("market order must not carry a price")]
    PriceNotAllowed,
    #[error("stop-limit order requires a stop price")]
    StopPriceRequired,
    #[error("price {price} is not aligned to tick size {tick_size}")]
    TickSize { price: Decimal, tick_size: Decimal },
    #[error("quantity {quantity} is not aligned to lot size {lot_size}")]
    LotSize { quantity: Decimal, lot_size: Decimal },
    #[error("quantity {quantity} below minimum {min}")]
    QuantityTooSmall { quantity: Decimal, min: Decimal },
    #[error("quantity {quantity} above maximum {max}")]
    QuantityTooLarge { quantity: Decimal, max: Decimal },
    #[error("price {price} outside allowed range [{min}, {max}]")]
    PriceOutOfBounds {
        price: Decimal,
        min: Decimal,
        max: Decimal,
    },
    #[error("no liquidity on the opposite side for market order")]
    NoLiquidity,
    #[error("fill-or-kill order cannot be fully filled")]
    FokUnsatisfiable,
}

/// Why a cancel request was refused. Refusal mutates nothing and emits nothing.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum CancelError {
    #[error("order {0:?} not found")]
    NotFound(OrderId),
    #[error("order {order_id:?} is {status:?} and cannot be cancelled")]
    NotCancellable {
        order_id: OrderId,
        status: OrderStatus,
    },
}

/// Fatal engine faults. Once one of these is produced, the engine halts the
/// affected symbol and refuses further mutation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    #[error("illegal order status transition {from:?} -> {to:?} for {order_id:?}")]
    InvalidTransition {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },
    #[error("engine for {0} is halted after an invariant violation")]
    Halted(Symbol),
}
