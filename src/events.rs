//! Outbound events: trades and order status changes.
//!
//! The engine reports every commit to an [`EventSink`] — the persistence and
//! market-data feed collaborator. Emission happens after the in-memory state
//! transition, inside the same critical section, and must not block on I/O;
//! sinks that persist or publish should enqueue and return.

use crate::types::{OrderId, OrderStatus, Trade};
use serde::Serialize;

/// Order status change, one per lifecycle transition.
#[derive(Clone, Debug, Serialize)]
pub struct OrderStatusChanged {
    pub order_id: OrderId,
    pub old_status: OrderStatus,
    pub new_status: OrderStatus,
    pub sequence: u64,
}

/// Sink for engine events. Implementations write to a feed, a store, or an
/// in-memory buffer (tests).
pub trait EventSink: Send + Sync {
    fn on_trade(&self, trade: &Trade);
    fn on_order_status_changed(&self, event: &OrderStatusChanged);
}

/// Discards all events. Default for embedders that poll state instead.
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn on_trade(&self, _trade: &Trade) {}
    fn on_order_status_changed(&self, _event: &OrderStatusChanged) {}
}

/// Writes one JSON line per event to stdout. Safe from multiple threads.
pub struct StdoutEventSink;

impl StdoutEventSink {
    fn emit_line<T: Serialize>(kind: &str, payload: &T) {
        #[derive(Serialize)]
        struct Line<'a, T> {
            event: &'a str,
            #[serde(flatten)]
            payload: &'a T,
        }
        if let Ok(line) = serde_json::to_string(&Line { event: kind, payload }) {
            println!("{}", line);
        }
    }
}

impl EventSink for StdoutEventSink {
    fn on_trade(&self, trade: &Trade) {
        Self::emit_line("trade", trade);
    }

    fn on_order_status_changed(&self, event: &OrderStatusChanged) {
        Self::emit_line("order_status_changed", event);
    }
}

/// Stores events for tests. Clone shares the same backing buffers.
#[derive(Clone, Default)]
pub struct InMemoryEventSink {
    trades: std::sync::Arc<std::sync::Mutex<Vec<Trade>>>,
    status_changes: std::sync::Arc<std::sync::Mutex<Vec<OrderStatusChanged>>>,
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trades(&self) -> Vec<Trade> {
        self.trades.lock().expect("lock").clone()
    }

    pub fn status_changes(&self) -> Vec<OrderStatusChanged> {
        self.status_changes.lock().expect("lock").clone()
    }

    pub fn clear(&self) {
        self.trades.lock().expect("lock").clear();
        self.status_changes.lock().expect("lock").clear();
    }
}

impl EventSink for InMemoryEventSink {
    fn on_trade(&self, trade: &Trade) {
        self.trades.lock().expect("lock").push(trade.clone());
    }

    fn on_order_status_changed(&self, event: &OrderStatusChanged) {
        self.status_changes.lock().expect("lock").push(event.clone());
    }
}
