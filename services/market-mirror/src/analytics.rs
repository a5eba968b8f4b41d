//! Derived analytics over the mirrored ladder
//!
//! All walks exploit the sorted sides: accumulation stops at the first level
//! failing its price predicate, and the taker simulation consumes levels in
//! natural order. Costs are `price × quantity` sums in `Decimal`; averages
//! are defined as 0 whenever the corresponding quantity is 0.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::{now_millis, Price, Quantity, Side, SideFilter, Symbol};

use crate::order_book::{OrderBook, PriceLevel};

/// Quantity/cost totals for one walked side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideTotals {
    pub quantity: Decimal,
    /// Σ price × quantity over the walked levels.
    pub cost: Decimal,
    /// cost / quantity, or 0 when nothing qualified.
    pub average_price: Decimal,
}

impl SideTotals {
    fn from_sums(quantity: Decimal, cost: Decimal) -> Self {
        let average_price = if quantity > Decimal::ZERO {
            cost / quantity
        } else {
            Decimal::ZERO
        };
        Self {
            quantity,
            cost,
            average_price,
        }
    }
}

/// Result of an accumulated-to-price query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulatedDepth {
    pub symbol: Symbol,
    pub target_price: Price,
    pub side: SideFilter,
    /// Bid levels with price ≥ target, when the filter includes bids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bids: Option<SideTotals>,
    /// Ask levels with price ≤ target, when the filter includes asks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asks: Option<SideTotals>,
    /// Totals across every included side.
    pub combined: SideTotals,
    pub timestamp: i64,
}

/// One ladder level consumed by a simulated taker order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumedLevel {
    pub price: Price,
    /// Quantity taken from this level (may be a partial fill of it).
    pub quantity: Decimal,
    pub cost: Decimal,
}

/// Result of a simulated taker order walking the opposite side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketImpact {
    pub order_size: Quantity,
    pub side: Side,
    pub total_cost: Decimal,
    /// Volume-weighted average fill price; 0 when nothing was consumed.
    pub average_price: Decimal,
    /// Price of the deepest level touched; 0 when nothing was consumed.
    pub final_price: Decimal,
    pub remaining_size: Decimal,
    pub filled_size: Decimal,
    pub levels_consumed: Vec<ConsumedLevel>,
    /// Percentage drift of the average fill from the pre-trade touch on the
    /// consumed side; 0 when nothing was consumed.
    pub slippage: Decimal,
    pub can_fill: bool,
}

/// One rung of the layered liquidity profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileLevel {
    pub price: Price,
    pub quantity: Quantity,
    pub accumulated_quantity: Decimal,
    pub accumulated_cost: Decimal,
    pub average_price: Decimal,
}

/// Running per-rung totals down both sides of the ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityProfile {
    pub symbol: Symbol,
    pub levels: usize,
    pub bids: Vec<ProfileLevel>,
    pub asks: Vec<ProfileLevel>,
    pub timestamp: i64,
}

impl OrderBook {
    /// Accumulate quantity and cost from the touch out to `target`.
    ///
    /// Bids qualify while price ≥ target, asks while price ≤ target; the
    /// sorted sides guarantee nothing beyond the first failing level
    /// qualifies.
    pub fn accumulated_to_price(&self, target: Price, side: SideFilter) -> AccumulatedDepth {
        let bids = side.includes_bids().then(|| {
            let mut quantity = Decimal::ZERO;
            let mut cost = Decimal::ZERO;
            for level in self.bids.range(target.as_decimal()..).map(|(_, l)| l) {
                quantity += level.quantity.as_decimal();
                cost += level.quantity * level.price;
            }
            SideTotals::from_sums(quantity, cost)
        });

        let asks = side.includes_asks().then(|| {
            let mut quantity = Decimal::ZERO;
            let mut cost = Decimal::ZERO;
            for level in self.asks.range(..=target.as_decimal()).map(|(_, l)| l) {
                quantity += level.quantity.as_decimal();
                cost += level.quantity * level.price;
            }
            SideTotals::from_sums(quantity, cost)
        });

        let combined_qty = bids.iter().chain(asks.iter()).map(|t| t.quantity).sum();
        let combined_cost = bids.iter().chain(asks.iter()).map(|t| t.cost).sum();

        AccumulatedDepth {
            symbol: self.symbol().clone(),
            target_price: target,
            side,
            bids,
            asks,
            combined: SideTotals::from_sums(combined_qty, combined_cost),
            timestamp: now_millis(),
        }
    }

    /// Simulate a taker order of `order_size` consuming the opposite side.
    ///
    /// A buy walks the asks ascending, a sell walks the bids descending,
    /// taking `min(remaining, level quantity)` at each rung until filled or
    /// the side is exhausted. Returns None for a zero order size.
    pub fn market_impact(&self, order_size: Quantity, side: Side) -> Option<MarketImpact> {
        if order_size.is_zero() {
            return None;
        }

        let levels: Vec<&PriceLevel> = match side {
            Side::Buy => self.asks.values().collect(),
            Side::Sell => self.bids.values().rev().collect(),
        };
        let pre_trade_best = levels.first().map(|l| l.price.as_decimal());

        let mut remaining = order_size.as_decimal();
        let mut total_cost = Decimal::ZERO;
        let mut final_price = Decimal::ZERO;
        let mut levels_consumed = Vec::new();

        for level in levels {
            if remaining <= Decimal::ZERO {
                break;
            }
            let price = level.price.as_decimal();
            let take = remaining.min(level.quantity.as_decimal());
            let cost = price * take;

            total_cost += cost;
            final_price = price;
            remaining -= take;
            levels_consumed.push(ConsumedLevel {
                price: level.price,
                quantity: take,
                cost,
            });
        }

        let filled_size = order_size.as_decimal() - remaining;
        let average_price = if filled_size > Decimal::ZERO {
            total_cost / filled_size
        } else {
            Decimal::ZERO
        };

        let slippage = match pre_trade_best {
            Some(best) if filled_size > Decimal::ZERO => {
                let drift = match side {
                    Side::Buy => average_price - best,
                    Side::Sell => best - average_price,
                };
                drift / best * Decimal::from(100)
            }
            _ => Decimal::ZERO,
        };

        Some(MarketImpact {
            order_size,
            side,
            total_cost,
            average_price,
            final_price,
            remaining_size: remaining,
            filled_size,
            levels_consumed,
            slippage,
            can_fill: remaining == Decimal::ZERO,
        })
    }

    /// Top-`levels` of each side with running accumulation per rung.
    pub fn liquidity_profile(&self, levels: usize) -> LiquidityProfile {
        fn accumulate<'a>(iter: impl Iterator<Item = &'a PriceLevel>) -> Vec<ProfileLevel> {
            let mut acc_qty = Decimal::ZERO;
            let mut acc_cost = Decimal::ZERO;
            iter.map(|level| {
                acc_qty += level.quantity.as_decimal();
                acc_cost += level.quantity * level.price;
                let average_price = if acc_qty > Decimal::ZERO {
                    acc_cost / acc_qty
                } else {
                    Decimal::ZERO
                };
                ProfileLevel {
                    price: level.price,
                    quantity: level.quantity,
                    accumulated_quantity: acc_qty,
                    accumulated_cost: acc_cost,
                    average_price,
                }
            })
            .collect()
        }

        LiquidityProfile {
            symbol: self.symbol().clone(),
            levels,
            bids: accumulate(self.bids.values().rev().take(levels)),
            asks: accumulate(self.asks.values().take(levels)),
            timestamp: now_millis(),
        }
    }
}
