//! Single-symbol matching engine facade.
//!
//! [`Engine`] owns the order book, the order store, and the ID/sequence
//! counters for one symbol, and is the single-writer critical section for all
//! mutations on that symbol. [`MultiEngine`] routes requests to per-symbol
//! engines; symbols are fully independent.

use crate::config::SymbolConfig;
use crate::error::{CancelError, EngineError, RejectReason};
use crate::events::{EventSink, NullEventSink};
use crate::lifecycle;
use crate::matching::match_order;
use crate::order_book::OrderBook;
use crate::types::{
    Order, OrderId, OrderRequest, OrderStatus, OrderType, OrderView, Side, Symbol, TimeInForce,
    Trade,
};
use log::{error, info};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Definite outcome of a submission: accepted (with any trades) or rejected
/// with a reason. Never thrown.
#[derive(Clone, Debug, serde::Serialize)]
pub struct OrderAcceptance {
    /// Assigned order id; absent only when routing failed (unknown symbol).
    pub order_id: Option<OrderId>,
    pub client_order_id: Option<String>,
    pub status: OrderStatus,
    pub reason: Option<RejectReason>,
    /// Trades produced by this submission, in strict match order. Trades from
    /// stop orders armed as a consequence go to the event sink only.
    pub trades: Vec<Trade>,
}

/// Outcome of a cancel request. Refusal is a report, not a fault.
#[derive(Clone, Debug, serde::Serialize)]
pub struct CancelResult {
    pub success: bool,
    pub reason: Option<CancelError>,
}

/// Two-sided depth snapshot, best prices first.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Depth {
    pub bids: Vec<(Decimal, Decimal)>,
    pub asks: Vec<(Decimal, Decimal)>,
}

/// What one internal matching pass did (before status resolution).
struct ExecOutcome {
    trades: Vec<Trade>,
    reject: Option<RejectReason>,
}

/// Matching engine for one symbol.
///
/// All mutating calls must be serialized by the caller (see [`MultiEngine`],
/// which wraps each engine in a mutex). After an invariant violation the
/// engine halts and refuses further mutation for this symbol.
pub struct Engine {
    config: SymbolConfig,
    book: OrderBook,
    /// Every order ever submitted to this symbol, by id.
    orders: HashMap<OrderId, Order>,
    /// Parked stop-limit orders in arrival order.
    stops: Vec<OrderId>,
    last_trade_price: Option<Decimal>,
    next_order_id: u64,
    next_trade_id: u64,
    /// Arrival sequence, assigned once per submission.
    next_arrival: u64,
    /// Emission sequence shared by trades and status events.
    next_event: u64,
    sink: Arc<dyn EventSink>,
    halted: bool,
}

impl Engine {
    /// Engine with no event sink (embedder polls state).
    pub fn new(config: SymbolConfig) -> Self {
        Self::with_sink(config, Arc::new(NullEventSink))
    }

    pub fn with_sink(config: SymbolConfig, sink: Arc<dyn EventSink>) -> Self {
        let book = OrderBook::new(config.symbol.clone());
        Self {
            config,
            book,
            orders: HashMap::new(),
            stops: Vec::new(),
            last_trade_price: None,
            next_order_id: 1,
            next_trade_id: 1,
            next_arrival: 1,
            next_event: 1,
            sink,
            halted: false,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.config.symbol
    }

    pub fn best_bid(&self) -> Option<Decimal> {
        self.book.best_bid()
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.book.best_ask()
    }

    pub fn last_trade_price(&self) -> Option<Decimal> {
        self.last_trade_price
    }

    /// True after an invariant violation; all mutations are refused.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Read-only snapshot of an order.
    pub fn get_order(&self, order_id: OrderId) -> Option<OrderView> {
        self.orders.get(&order_id).map(OrderView::from)
    }

    /// Top-of-book depth, `levels` per side.
    pub fn depth(&self, levels: usize) -> Depth {
        Depth {
            bids: self.book.depth(Side::Buy, levels).collect(),
            asks: self.book.depth(Side::Sell, levels).collect(),
        }
    }

    /// Submit one order: validate, match, resolve time-in-force, arm any
    /// triggered stop orders, and return a definite outcome.
    ///
    /// `Err` is returned only for fatal faults (invariant violations or a
    /// halted engine); all business rejections come back inside the acceptance.
    pub fn submit_order(&mut self, req: OrderRequest) -> Result<OrderAcceptance, EngineError> {
        if self.halted {
            return Err(EngineError::Halted(self.config.symbol.clone()));
        }
        let result = self.submit_inner(req);
        self.halt_on_fault(&result);
        result
    }

    /// Cancel a resting or parked order. Idempotent: cancelling a terminal or
    /// unknown order reports failure without mutating state or emitting events.
    pub fn cancel_order(&mut self, order_id: OrderId) -> Result<CancelResult, EngineError> {
        if self.halted {
            return Err(EngineError::Halted(self.config.symbol.clone()));
        }
        let result = self.cancel_inner(order_id, OrderStatus::Cancelled);
        self.halt_on_fault(&result);
        result
    }

    /// Sweep resting and parked orders whose `expires_at` has passed and
    /// cancel them with status `Expired`. Returns the expired order ids.
    /// Periodic maintenance, not part of the hot matching path.
    pub fn expire_gtd_orders(&mut self, now: u64) -> Result<Vec<OrderId>, EngineError> {
        if self.halted {
            return Err(EngineError::Halted(self.config.symbol.clone()));
        }
        let due: Vec<OrderId> = self
            .orders
            .values()
            .filter(|o| {
                lifecycle::is_cancellable(o.status)
                    && o.expires_at.map_or(false, |deadline| deadline <= now)
            })
            .map(|o| o.order_id)
            .collect();
        let mut expired = Vec::with_capacity(due.len());
        for order_id in due {
            let result = self.cancel_inner(order_id, OrderStatus::Expired);
            self.halt_on_fault(&result);
            if result?.success {
                info!("order expired order_id={}", order_id.0);
                expired.push(order_id);
            }
        }
        Ok(expired)
    }

    fn submit_inner(&mut self, req: OrderRequest) -> Result<OrderAcceptance, EngineError> {
        let order_id = OrderId(self.next_order_id);
        self.next_order_id += 1;
        let sequence = self.next_arrival;
        self.next_arrival += 1;

        info!(
            "order submitted symbol={} order_id={} side={:?} type={:?} qty={} price={:?} tif={:?}",
            req.symbol, order_id.0, req.side, req.order_type, req.quantity, req.price,
            req.time_in_force
        );

        let mut order = Order {
            order_id,
            client_order_id: req.client_order_id.clone(),
            symbol: req.symbol.clone(),
            side: req.side,
            order_type: req.order_type,
            quantity: req.quantity,
            remaining_quantity: req.quantity,
            price: req.price,
            stop_price: req.stop_price,
            time_in_force: req.time_in_force,
            status: OrderStatus::New,
            owner: req.owner,
            expires_at: req.expires_at,
            sequence,
            timestamp: req.timestamp,
        };

        if let Err(reason) = self.config.validate(&req) {
            info!("order rejected order_id={} reason={}", order_id.0, reason);
            let seq = self.bump_event();
            lifecycle::transition(&mut order, OrderStatus::Rejected, seq, self.sink.as_ref())?;
            self.orders.insert(order_id, order);
            return Ok(self.acceptance(order_id, Some(reason), Vec::new()));
        }

        self.orders.insert(order_id, order);

        // Stop-limit orders park until the last trade price reaches the stop.
        if req.order_type == OrderType::StopLimit && !self.stop_triggered(order_id) {
            let seq = self.bump_event();
            if let Some(o) = self.orders.get_mut(&order_id) {
                lifecycle::transition(o, OrderStatus::Open, seq, self.sink.as_ref())?;
            }
            self.stops.push(order_id);
            return Ok(self.acceptance(order_id, None, Vec::new()));
        }

        let exec = self.match_and_commit(order_id)?;
        if let Some(reason) = exec.reject {
            info!("order rejected order_id={} reason={}", order_id.0, reason);
            let seq = self.bump_event();
            if let Some(o) = self.orders.get_mut(&order_id) {
                lifecycle::transition(o, OrderStatus::Rejected, seq, self.sink.as_ref())?;
            }
            return Ok(self.acceptance(order_id, Some(reason), Vec::new()));
        }

        self.trigger_stops()?;
        self.audit_book()?;
        Ok(self.acceptance(order_id, None, exec.trades))
    }

    /// One matching pass for a stored order: pre-checks, crossing loop, fill
    /// commit, taker status resolution. Rejections mutate nothing and are
    /// resolved by the caller (fresh order vs. armed stop).
    fn match_and_commit(&mut self, order_id: OrderId) -> Result<ExecOutcome, EngineError> {
        let order = self.orders.get(&order_id).cloned().ok_or_else(|| {
            EngineError::InvariantViolation(format!("order {} missing from store", order_id.0))
        })?;

        // FOK is all-or-nothing: simulate availability (self orders excluded)
        // before touching the book.
        let price_limit = match (order.side, order.price) {
            (_, Some(p)) => p,
            (Side::Buy, None) => Decimal::MAX,
            (Side::Sell, None) => Decimal::ZERO,
        };
        let available = match order.side {
            Side::Buy => self.book.available_ask_qty_at_or_below(price_limit, order.owner),
            Side::Sell => self.book.available_bid_qty_at_or_above(price_limit, order.owner),
        };
        if order.is_market() && available.is_zero() {
            return Ok(ExecOutcome {
                trades: Vec::new(),
                reject: Some(RejectReason::NoLiquidity),
            });
        }
        if order.time_in_force == TimeInForce::FOK && available < order.remaining_quantity {
            return Ok(ExecOutcome {
                trades: Vec::new(),
                reject: Some(RejectReason::FokUnsatisfiable),
            });
        }

        let outcome = match_order(
            &mut self.book,
            &self.config,
            &order,
            self.next_trade_id,
            self.next_event,
        )?;
        self.next_trade_id += outcome.trades.len() as u64;
        self.next_event += outcome.trades.len() as u64;

        // Commit maker side: one decrement per trade, exactly once.
        let sink = Arc::clone(&self.sink);
        let mut seq = self.next_event;
        for trade in &outcome.trades {
            sink.on_trade(trade);
            info!(
                "trade symbol={} trade_id={} maker={} taker={} price={} qty={}",
                trade.symbol, trade.trade_id.0, trade.maker_order_id.0, trade.taker_order_id.0,
                trade.price, trade.quantity
            );
            let maker = self.orders.get_mut(&trade.maker_order_id).ok_or_else(|| {
                EngineError::InvariantViolation(format!(
                    "maker order {} missing from store",
                    trade.maker_order_id.0
                ))
            })?;
            maker.remaining_quantity -= trade.quantity;
            if maker.remaining_quantity < Decimal::ZERO {
                return Err(EngineError::InvariantViolation(format!(
                    "maker order {} remaining went negative",
                    maker.order_id.0
                )));
            }
            let status = if maker.remaining_quantity.is_zero() {
                OrderStatus::Filled
            } else {
                OrderStatus::PartiallyFilled
            };
            lifecycle::transition(maker, status, seq, sink.as_ref())?;
            seq += 1;
        }

        // Commit taker side.
        let taker = self.orders.get_mut(&order_id).ok_or_else(|| {
            EngineError::InvariantViolation(format!("order {} missing from store", order_id.0))
        })?;
        taker.remaining_quantity = outcome.remaining_quantity;
        if outcome.remaining_quantity.is_zero() {
            lifecycle::transition(taker, OrderStatus::Filled, seq, sink.as_ref())?;
            seq += 1;
        } else if outcome.rested {
            let status = if outcome.filled_quantity.is_zero() {
                OrderStatus::Open
            } else {
                OrderStatus::PartiallyFilled
            };
            if taker.status != status {
                lifecycle::transition(taker, status, seq, sink.as_ref())?;
                seq += 1;
            }
        } else if outcome.cancelled_remainder {
            if !outcome.filled_quantity.is_zero() && taker.status != OrderStatus::PartiallyFilled {
                lifecycle::transition(taker, OrderStatus::PartiallyFilled, seq, sink.as_ref())?;
                seq += 1;
            }
            lifecycle::transition(taker, OrderStatus::Cancelled, seq, sink.as_ref())?;
            seq += 1;
        }
        self.next_event = seq;

        if let Some(last) = outcome.trades.last() {
            self.last_trade_price = Some(last.price);
        }

        Ok(ExecOutcome {
            trades: outcome.trades,
            reject: None,
        })
    }

    /// Arm and execute parked stop orders whose trigger the last trade price
    /// has reached, repeating until no further stop arms. Runs inside the same
    /// critical section as the submission that moved the price.
    fn trigger_stops(&mut self) -> Result<(), EngineError> {
        loop {
            let pos = self
                .stops
                .iter()
                .position(|id| self.stop_triggered(*id));
            let Some(pos) = pos else { return Ok(()) };
            let order_id = self.stops.remove(pos);
            info!("stop order armed order_id={}", order_id.0);
            let exec = self.match_and_commit(order_id)?;
            if let Some(reason) = exec.reject {
                // An armed stop that cannot execute (e.g. FOK) is cancelled,
                // not rejected: it was already accepted when parked.
                info!("armed stop cancelled order_id={} reason={}", order_id.0, reason);
                let seq = self.bump_event();
                if let Some(o) = self.orders.get_mut(&order_id) {
                    lifecycle::transition(o, OrderStatus::Cancelled, seq, self.sink.as_ref())?;
                }
            }
        }
    }

    fn stop_triggered(&self, order_id: OrderId) -> bool {
        let Some(last) = self.last_trade_price else {
            return false;
        };
        self.orders.get(&order_id).map_or(false, |o| {
            match (o.side, o.stop_price) {
                // Buy stops arm when the market trades up to the stop,
                // sell stops when it trades down to it.
                (Side::Buy, Some(stop)) => last >= stop,
                (Side::Sell, Some(stop)) => last <= stop,
                _ => false,
            }
        })
    }

    fn cancel_inner(
        &mut self,
        order_id: OrderId,
        terminal: OrderStatus,
    ) -> Result<CancelResult, EngineError> {
        let Some(status) = self.orders.get(&order_id).map(|o| o.status) else {
            return Ok(CancelResult {
                success: false,
                reason: Some(CancelError::NotFound(order_id)),
            });
        };
        if !lifecycle::is_cancellable(status) {
            return Ok(CancelResult {
                success: false,
                reason: Some(CancelError::NotCancellable { order_id, status }),
            });
        }

        self.book.remove_resting(order_id);
        self.stops.retain(|id| *id != order_id);

        let seq = self.bump_event();
        if let Some(order) = self.orders.get_mut(&order_id) {
            lifecycle::transition(order, terminal, seq, self.sink.as_ref())?;
        }
        info!("order cancelled order_id={} status={:?}", order_id.0, terminal);
        Ok(CancelResult {
            success: true,
            reason: None,
        })
    }

    /// Post-drain invariant audit: the book must not be crossed and every
    /// level aggregate must match its entries.
    fn audit_book(&self) -> Result<(), EngineError> {
        if let (Some(bid), Some(ask)) = (self.book.best_bid(), self.book.best_ask()) {
            if bid >= ask {
                return Err(EngineError::InvariantViolation(format!(
                    "book crossed after drain: best_bid {} >= best_ask {}",
                    bid, ask
                )));
            }
        }
        if !self.book.levels_consistent() {
            return Err(EngineError::InvariantViolation(
                "price level aggregate mismatch".into(),
            ));
        }
        Ok(())
    }

    fn halt_on_fault<T>(&mut self, result: &Result<T, EngineError>) {
        if let Err(e) = result {
            if !matches!(e, EngineError::Halted(_)) {
                error!("engine halted symbol={} fault={}", self.config.symbol, e);
                self.halted = true;
            }
        }
    }

    fn bump_event(&mut self) -> u64 {
        let seq = self.next_event;
        self.next_event += 1;
        seq
    }

    fn acceptance(
        &self,
        order_id: OrderId,
        reason: Option<RejectReason>,
        trades: Vec<Trade>,
    ) -> OrderAcceptance {
        let order = self.orders.get(&order_id);
        OrderAcceptance {
            order_id: Some(order_id),
            client_order_id: order.and_then(|o| o.client_order_id.clone()),
            status: order.map_or(OrderStatus::Rejected, |o| o.status),
            reason,
            trades,
        }
    }
}

/// Routes requests to per-symbol engines. Each engine sits behind its own
/// mutex, so one symbol's matching never blocks another's.
#[derive(Default)]
pub struct MultiEngine {
    engines: HashMap<Symbol, Mutex<Engine>>,
}

impl MultiEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a symbol. Replaces any existing engine for the same symbol.
    pub fn add_symbol(&mut self, config: SymbolConfig, sink: Arc<dyn EventSink>) {
        let symbol = config.symbol.clone();
        self.engines
            .insert(symbol, Mutex::new(Engine::with_sink(config, sink)));
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        self.engines.keys().cloned().collect()
    }

    /// Route a submission to its symbol's engine. Unknown symbols are a
    /// rejection, not a fault.
    pub fn submit_order(&self, req: OrderRequest) -> Result<OrderAcceptance, EngineError> {
        let Some(engine) = self.engines.get(&req.symbol) else {
            return Ok(OrderAcceptance {
                order_id: None,
                client_order_id: req.client_order_id,
                status: OrderStatus::Rejected,
                reason: Some(RejectReason::UnknownSymbol(req.symbol)),
                trades: Vec::new(),
            });
        };
        engine.lock().expect("engine lock").submit_order(req)
    }

    pub fn cancel_order(
        &self,
        symbol: &Symbol,
        order_id: OrderId,
    ) -> Result<CancelResult, EngineError> {
        let Some(engine) = self.engines.get(symbol) else {
            return Ok(CancelResult {
                success: false,
                reason: Some(CancelError::NotFound(order_id)),
            });
        };
        engine.lock().expect("engine lock").cancel_order(order_id)
    }

    pub fn get_order(&self, symbol: &Symbol, order_id: OrderId) -> Option<OrderView> {
        self.engines
            .get(symbol)?
            .lock()
            .expect("engine lock")
            .get_order(order_id)
    }

    pub fn depth(&self, symbol: &Symbol, levels: usize) -> Option<Depth> {
        Some(self.engines.get(symbol)?.lock().expect("engine lock").depth(levels))
    }

    /// Run the GTD sweep on every symbol. Returns expired ids per symbol.
    pub fn expire_gtd_orders(&self, now: u64) -> Result<Vec<(Symbol, Vec<OrderId>)>, EngineError> {
        let mut out = Vec::new();
        for (symbol, engine) in &self.engines {
            let expired = engine.lock().expect("engine lock").expire_gtd_orders(now)?;
            if !expired.is_empty() {
                out.push((symbol.clone(), expired));
            }
        }
        Ok(out)
    }
}
