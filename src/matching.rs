//! Price-time priority matching step.
//!
//! [`match_order`] runs one validated order against the book: takes liquidity
//! at the makers' prices (price improvement goes to the taker), produces one
//! [`Trade`] per fill, and rests or drops the remainder per time-in-force.
//! Status transitions and event emission stay with the engine.

use crate::config::SymbolConfig;
use crate::error::EngineError;
use crate::order_book::{Fill, OrderBook};
use crate::types::{Order, Side, TimeInForce, Trade, TradeId};
use rust_decimal::Decimal;

/// What one matching step did. The engine turns this into status transitions
/// and events.
#[derive(Clone, Debug)]
pub struct MatchOutcome {
    /// Trades in strict match order.
    pub trades: Vec<Trade>,
    pub filled_quantity: Decimal,
    pub remaining_quantity: Decimal,
    /// Remainder was placed on the book.
    pub rested: bool,
    /// Remainder was dropped (IOC, market leftovers, or a remainder that would
    /// only cross the taker's own resting orders).
    pub cancelled_remainder: bool,
}

/// Run one order through the crossing loop.
///
/// Preconditions (enforced by the engine): the order passed validation, FOK
/// orders passed the all-or-nothing pre-check, market orders have non-self
/// liquidity to take, and limit orders carry a price.
pub fn match_order(
    book: &mut OrderBook,
    cfg: &SymbolConfig,
    order: &Order,
    next_trade_id: u64,
    next_sequence: u64,
) -> Result<MatchOutcome, EngineError> {
    // Market orders take every level; limit orders stop at their price.
    let price_limit = match (order.side, order.price) {
        (_, Some(p)) => p,
        (Side::Buy, None) => Decimal::MAX,
        (Side::Sell, None) => Decimal::ZERO,
    };
    if order.is_limit() && order.price.is_none() {
        return Err(EngineError::InvariantViolation(format!(
            "limit order {} reached matching without a price",
            order.order_id.0
        )));
    }

    let fills: Vec<Fill> = match order.side {
        Side::Buy => book.take_from_asks(price_limit, order.remaining_quantity, order.owner)?,
        Side::Sell => book.take_from_bids(price_limit, order.remaining_quantity, order.owner)?,
    };

    let mut trades = Vec::with_capacity(fills.len());
    let mut filled = Decimal::ZERO;
    for (i, f) in fills.iter().enumerate() {
        filled += f.quantity;
        // Wide intermediate product, then round to the quote precision.
        let notional = (f.price * f.quantity).round_dp(cfg.quote_precision);
        trades.push(Trade {
            trade_id: TradeId(next_trade_id + i as u64),
            symbol: book.symbol().clone(),
            maker_order_id: f.maker_order_id,
            taker_order_id: order.order_id,
            price: f.price,
            quantity: f.quantity,
            notional,
            maker_side: order.side.opposite(),
            timestamp: order.timestamp,
            sequence: next_sequence + i as u64,
        });
    }

    let remaining = order.remaining_quantity - filled;
    if remaining < Decimal::ZERO {
        return Err(EngineError::InvariantViolation(format!(
            "order {} overfilled: remaining {}",
            order.order_id.0, remaining
        )));
    }

    let mut rested = false;
    let mut cancelled_remainder = false;
    if remaining > Decimal::ZERO {
        match order.time_in_force {
            TimeInForce::FOK => {
                // The engine's pre-check guarantees full fillability.
                return Err(EngineError::InvariantViolation(format!(
                    "FOK order {} left {} unfilled after passing pre-check",
                    order.order_id.0, remaining
                )));
            }
            TimeInForce::IOC => cancelled_remainder = true,
            TimeInForce::GTC => {
                if order.is_market() {
                    // Market orders never rest.
                    cancelled_remainder = true;
                } else if would_self_cross(book, order.side, price_limit) {
                    // Everything still crossing is the taker's own resting
                    // orders (non-self liquidity was consumed above). Resting
                    // would leave the book crossed, so drop the remainder.
                    cancelled_remainder = true;
                } else {
                    book.insert_resting(
                        order.order_id,
                        order.owner,
                        order.side,
                        price_limit,
                        remaining,
                    );
                    rested = true;
                }
            }
        }
    }

    Ok(MatchOutcome {
        trades,
        filled_quantity: filled,
        remaining_quantity: remaining,
        rested,
        cancelled_remainder,
    })
}

/// True when resting at `price_limit` would cross the opposite best.
fn would_self_cross(book: &OrderBook, side: Side, price_limit: Decimal) -> bool {
    match side {
        Side::Buy => book.best_ask().map_or(false, |ask| ask <= price_limit),
        Side::Sell => book.best_bid().map_or(false, |bid| bid >= price_limit),
    }
}
