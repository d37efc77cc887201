//! Order status state machine.
//!
//! NEW -> {REJECTED, OPEN, PARTIALLY_FILLED, FILLED, CANCELLED};
//! OPEN / PARTIALLY_FILLED -> {PARTIALLY_FILLED, FILLED, CANCELLED, EXPIRED}.
//! Terminal statuses are final. Every applied transition is reported to the
//! event sink; illegal transitions are engine bugs and surface as
//! [`EngineError::InvalidTransition`].

use crate::error::EngineError;
use crate::events::{EventSink, OrderStatusChanged};
use crate::types::{Order, OrderStatus};
use log::debug;

/// Whether `from -> to` is a legal lifecycle transition.
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    match from {
        New => matches!(to, Open | PartiallyFilled | Filled | Cancelled | Rejected),
        Open => matches!(to, PartiallyFilled | Filled | Cancelled | Expired),
        // PartiallyFilled -> PartiallyFilled covers repeated fills.
        PartiallyFilled => matches!(to, PartiallyFilled | Filled | Cancelled | Expired),
        Filled | Cancelled | Rejected | Expired => false,
    }
}

/// Statuses from which a user cancel is legal.
pub fn is_cancellable(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Open | OrderStatus::PartiallyFilled)
}

/// Apply a transition to `order` and report it to the sink.
///
/// `sequence` is the engine's event sequence for this change.
pub fn transition(
    order: &mut Order,
    to: OrderStatus,
    sequence: u64,
    sink: &dyn EventSink,
) -> Result<(), EngineError> {
    let from = order.status;
    if !can_transition(from, to) {
        return Err(EngineError::InvalidTransition {
            order_id: order.order_id,
            from,
            to,
        });
    }
    order.status = to;
    debug!(
        "order {} status {:?} -> {:?}",
        order.order_id.0, from, to
    );
    sink.on_order_status_changed(&OrderStatusChanged {
        order_id: order.order_id,
        old_status: from,
        new_status: to,
        sequence,
    });
    Ok(())
}
