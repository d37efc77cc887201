//! Per-symbol static configuration and order validation.
//!
//! Supplied by the embedding service (exchange listing data); the engine only
//! reads it. All checks reject with a [`RejectReason`] and mutate nothing.

use crate::error::RejectReason;
use crate::types::{OrderRequest, OrderType, Symbol};
use rust_decimal::Decimal;

/// Listing parameters for one symbol.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SymbolConfig {
    pub symbol: Symbol,
    /// Minimum price increment. Prices must be an integer multiple of this.
    pub tick_size: Decimal,
    /// Minimum quantity increment.
    pub lot_size: Decimal,
    pub min_quantity: Decimal,
    pub max_quantity: Decimal,
    pub min_price: Decimal,
    pub max_price: Decimal,
    /// Decimal places of the quote currency; trade notionals round to this.
    pub quote_precision: u32,
}

impl SymbolConfig {
    /// Validate an inbound request against this symbol's listing rules.
    ///
    /// Checks, in order: symbol match, price presence by order type, stop price
    /// presence, tick/lot alignment, quantity and price bounds.
    pub fn validate(&self, req: &OrderRequest) -> Result<(), RejectReason> {
        if req.symbol != self.symbol {
            return Err(RejectReason::SymbolMismatch {
                order: req.symbol.clone(),
                engine: self.symbol.clone(),
            });
        }

        match req.order_type {
            OrderType::Market => {
                if req.price.is_some() {
                    return Err(RejectReason::PriceNotAllowed);
                }
            }
            OrderType::Limit | OrderType::StopLimit => {
                let price = match req.price {
                    Some(p) if p > Decimal::ZERO => p,
                    _ => return Err(RejectReason::PriceRequired),
                };
                if req.order_type == OrderType::StopLimit {
                    match req.stop_price {
                        Some(sp) if sp > Decimal::ZERO => {
                            self.check_price(sp)?;
                        }
                        _ => return Err(RejectReason::StopPriceRequired),
                    }
                }
                self.check_price(price)?;
            }
        }

        if req.quantity < self.min_quantity {
            return Err(RejectReason::QuantityTooSmall {
                quantity: req.quantity,
                min: self.min_quantity,
            });
        }
        if req.quantity > self.max_quantity {
            return Err(RejectReason::QuantityTooLarge {
                quantity: req.quantity,
                max: self.max_quantity,
            });
        }
        if !self.lot_size.is_zero() && !(req.quantity % self.lot_size).is_zero() {
            return Err(RejectReason::LotSize {
                quantity: req.quantity,
                lot_size: self.lot_size,
            });
        }
        Ok(())
    }

    fn check_price(&self, price: Decimal) -> Result<(), RejectReason> {
        if price < self.min_price || price > self.max_price {
            return Err(RejectReason::PriceOutOfBounds {
                price,
                min: self.min_price,
                max: self.max_price,
            });
        }
        if !self.tick_size.is_zero() && !(price % self.tick_size).is_zero() {
            return Err(RejectReason::TickSize {
                price,
                tick_size: self.tick_size,
            });
        }
        Ok(())
    }
}
