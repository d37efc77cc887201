//! Single-symbol order book: bids and asks as ordered maps of price levels.
//!
//! Best bid is the highest bid price, best ask the lowest ask price. Each
//! level is FIFO ([`crate::price_level::PriceLevel`]); taking liquidity walks
//! levels in price order and entries in arrival order, skipping same-owner
//! entries for self-trade prevention.

use crate::error::EngineError;
use crate::price_level::PriceLevel;
use crate::types::{OrderId, OwnerId, Side, Symbol};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// Result of taking liquidity from the book (one per resting order filled).
#[derive(Clone, Debug)]
pub struct Fill {
    pub maker_order_id: OrderId,
    pub maker_owner: OwnerId,
    pub price: Decimal,
    pub quantity: Decimal,
    /// True if the resting order was fully filled (detached from its level).
    pub maker_fully_filled: bool,
}

/// Two-sided book of price levels for one symbol.
#[derive(Debug)]
pub struct OrderBook {
    symbol: Symbol,
    bids: BTreeMap<Decimal, PriceLevel>,
    asks: BTreeMap<Decimal, PriceLevel>,
    /// Side and level price per resting order, for O(log n) cancel.
    index: HashMap<OrderId, (Side, Decimal)>,
}

impl OrderBook {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Place a resting order at its price level, creating the level if needed.
    /// The caller (matching step) has already validated price and quantity.
    pub fn insert_resting(
        &mut self,
        order_id: OrderId,
        owner: OwnerId,
        side: Side,
        price: Decimal,
        quantity: Decimal,
    ) {
        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        levels
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price))
            .append(order_id, owner, quantity);
        self.index.insert(order_id, (side, price));
    }

    /// Remove a resting order by id; deletes its level if it becomes empty.
    /// Returns `(side, price, remaining_quantity)` or `None` if not resting.
    pub fn remove_resting(&mut self, order_id: OrderId) -> Option<(Side, Decimal, Decimal)> {
        let (side, price) = self.index.remove(&order_id)?;
        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let level = levels.get_mut(&price)?;
        let remaining = level.remove(order_id)?;
        if level.is_empty() {
            levels.remove(&price);
        }
        Some((side, price, remaining))
    }

    /// Whether an order currently rests on the book.
    pub fn contains(&self, order_id: OrderId) -> bool {
        self.index.contains_key(&order_id)
    }

    /// Best bid price (highest), if any.
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.keys().next_back().copied()
    }

    /// Best ask price (lowest), if any.
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.keys().next().copied()
    }

    /// Top `n_levels` of one side as `(price, aggregate_quantity)`, best first.
    /// Lazy and finite; collect it under the same serialization as mutations.
    pub fn depth(&self, side: Side, n_levels: usize) -> impl Iterator<Item = (Decimal, Decimal)> + '_ {
        let (forward, backward) = match side {
            Side::Buy => (None, Some(self.bids.iter().rev())),
            Side::Sell => (Some(self.asks.iter()), None),
        };
        forward
            .into_iter()
            .flatten()
            .chain(backward.into_iter().flatten())
            .take(n_levels)
            .map(|(price, level)| (*price, level.total_quantity()))
    }

    /// Total ask quantity at or below `price_limit`, excluding `owner`'s own
    /// orders. Used for the FOK all-or-nothing pre-check.
    pub fn available_ask_qty_at_or_below(&self, price_limit: Decimal, owner: OwnerId) -> Decimal {
        let mut total = Decimal::ZERO;
        for (&price, level) in self.asks.iter() {
            if price > price_limit {
                break;
            }
            for entry in level.iter() {
                if entry.owner != owner {
                    total += entry.remaining_quantity;
                }
            }
        }
        total
    }

    /// Total bid quantity at or above `price_limit`, excluding `owner`'s own orders.
    pub fn available_bid_qty_at_or_above(&self, price_limit: Decimal, owner: OwnerId) -> Decimal {
        let mut total = Decimal::ZERO;
        for (_, level) in self.bids.range(price_limit..) {
            for entry in level.iter() {
                if entry.owner != owner {
                    total += entry.remaining_quantity;
                }
            }
        }
        total
    }

    /// Take liquidity from the ask side (incoming buy). Price-time priority;
    /// entries owned by `exclude_owner` are skipped in place.
    pub fn take_from_asks(
        &mut self,
        price_limit: Decimal,
        quantity: Decimal,
        exclude_owner: OwnerId,
    ) -> Result<Vec<Fill>, EngineError> {
        let prices: Vec<Decimal> = self
            .asks
            .range(..=price_limit)
            .map(|(p, _)| *p)
            .collect();
        self.take_at_prices(Side::Sell, prices, quantity, exclude_owner)
    }

    /// Take liquidity from the bid side (incoming sell), best bid first.
    pub fn take_from_bids(
        &mut self,
        price_limit: Decimal,
        quantity: Decimal,
        exclude_owner: OwnerId,
    ) -> Result<Vec<Fill>, EngineError> {
        let prices: Vec<Decimal> = self
            .bids
            .range(price_limit..)
            .rev()
            .map(|(p, _)| *p)
            .collect();
        self.take_at_prices(Side::Buy, prices, quantity, exclude_owner)
    }

    fn take_at_prices(
        &mut self,
        maker_side: Side,
        prices: Vec<Decimal>,
        mut quantity: Decimal,
        exclude_owner: OwnerId,
    ) -> Result<Vec<Fill>, EngineError> {
        let levels = match maker_side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let mut fills = Vec::new();
        for price in prices {
            if quantity <= Decimal::ZERO {
                break;
            }
            let level = match levels.get_mut(&price) {
                Some(l) => l,
                None => continue,
            };
            let mut i = 0;
            while quantity > Decimal::ZERO {
                let entry = match level.entry(i) {
                    Some(e) => *e,
                    None => break,
                };
                if entry.owner == exclude_owner {
                    i += 1;
                    continue;
                }
                let fill_qty = quantity.min(entry.remaining_quantity);
                let removed = level.reduce_at(i, fill_qty).ok_or_else(|| {
                    EngineError::InvariantViolation(format!(
                        "level {} reduce failed for order {}",
                        price, entry.order_id.0
                    ))
                })?;
                quantity -= fill_qty;
                fills.push(Fill {
                    maker_order_id: entry.order_id,
                    maker_owner: entry.owner,
                    price,
                    quantity: fill_qty,
                    maker_fully_filled: removed,
                });
                if removed {
                    self.index.remove(&entry.order_id);
                    // next entry slid into position i
                } else {
                    i += 1;
                }
            }
            if level.is_empty() {
                levels.remove(&price);
            }
        }
        Ok(fills)
    }

    /// True when every level's denormalized aggregate matches its entry sum
    /// and every indexed order is present. Invariant audit, not a hot-path call.
    pub fn levels_consistent(&self) -> bool {
        self.bids
            .values()
            .chain(self.asks.values())
            .all(|l| l.aggregate_consistent() && !l.is_empty())
    }

    /// Number of resting orders across both sides.
    pub fn resting_order_count(&self) -> usize {
        self.index.len()
    }
}
