//! One price level: a FIFO queue of resting orders at a single price.
//!
//! Entries keep insertion order (arrival order) for time priority. The level
//! carries a denormalized aggregate quantity so depth queries are O(1); the
//! aggregate must always equal the sum of entry remainders.

use crate::types::{OrderId, OwnerId};
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// One resting order's slot in the queue. The remaining quantity here is the
/// book's authoritative copy, written only from the matching critical section.
#[derive(Clone, Copy, Debug)]
pub struct LevelEntry {
    pub order_id: OrderId,
    pub owner: OwnerId,
    pub remaining_quantity: Decimal,
}

/// FIFO container of resting orders at one exact price.
#[derive(Clone, Debug)]
pub struct PriceLevel {
    price: Decimal,
    entries: VecDeque<LevelEntry>,
    total_quantity: Decimal,
}

impl PriceLevel {
    pub fn new(price: Decimal) -> Self {
        Self {
            price,
            entries: VecDeque::new(),
            total_quantity: Decimal::ZERO,
        }
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Add an order at the tail of the queue.
    pub fn append(&mut self, order_id: OrderId, owner: OwnerId, quantity: Decimal) {
        self.entries.push_back(LevelEntry {
            order_id,
            owner,
            remaining_quantity: quantity,
        });
        self.total_quantity += quantity;
    }

    /// Oldest resting order, without removing it.
    pub fn peek_head(&self) -> Option<&LevelEntry> {
        self.entries.front()
    }

    /// Entry at queue position `i` (0 = oldest). Used by the matching loop to
    /// scan past same-owner entries.
    pub fn entry(&self, i: usize) -> Option<&LevelEntry> {
        self.entries.get(i)
    }

    /// Decrement the entry at position `i` by `filled_qty`. Removes the entry
    /// when its remainder reaches zero. Returns `Some(true)` if the entry was
    /// removed, `Some(false)` if it remains, `None` if `i` is out of range or
    /// `filled_qty` exceeds the entry's remainder.
    pub fn reduce_at(&mut self, i: usize, filled_qty: Decimal) -> Option<bool> {
        let entry = self.entries.get_mut(i)?;
        if filled_qty > entry.remaining_quantity {
            return None;
        }
        entry.remaining_quantity -= filled_qty;
        self.total_quantity -= filled_qty;
        if entry.remaining_quantity.is_zero() {
            self.entries.remove(i);
            Some(true)
        } else {
            Some(false)
        }
    }

    /// Decrement the head order. See [`PriceLevel::reduce_at`].
    pub fn reduce_head(&mut self, filled_qty: Decimal) -> Option<bool> {
        self.reduce_at(0, filled_qty)
    }

    /// Arbitrary removal for cancellation. Returns the removed remainder.
    /// O(n) over the level; acceptable at typical level depth.
    pub fn remove(&mut self, order_id: OrderId) -> Option<Decimal> {
        let pos = self.entries.iter().position(|e| e.order_id == order_id)?;
        let entry = self.entries.remove(pos)?;
        self.total_quantity -= entry.remaining_quantity;
        Some(entry.remaining_quantity)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Aggregate remainder across all entries (O(1), denormalized).
    pub fn total_quantity(&self) -> Decimal {
        self.total_quantity
    }

    pub fn iter(&self) -> impl Iterator<Item = &LevelEntry> {
        self.entries.iter()
    }

    /// True when the denormalized aggregate matches the entry sum. Checked by
    /// the engine's invariant audit.
    pub fn aggregate_consistent(&self) -> bool {
        let sum: Decimal = self.entries.iter().map(|e| e.remaining_quantity).sum();
        sum == self.total_quantity
    }
}
