//! Rebalancing decision logic.
//!
//! Pure function of a balance snapshot, trigger band, market quote and the
//! rebalance configuration. Performs no I/O.

use crate::config::RebalanceConfig;
use crate::error::{RebalanceError, Result};
use crate::exchange::{OrderIntent, OrderSide};
use crate::strategy::snapshot::{BalanceSnapshot, MarketQuote, TradeTriggerBand};
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Outcome of a single decision.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Price is inside the trigger band
    Hold,
    /// A trade was triggered but its size does not exceed the exchange minimum
    DustSkipped {
        side: OrderSide,
        size: Decimal,
        min_size: Decimal,
    },
    /// Submit this order
    Place(OrderIntent),
}

impl Decision {
    pub fn into_intent(self) -> Option<OrderIntent> {
        match self {
            Decision::Place(intent) => Some(intent),
            _ => None,
        }
    }
}

/// Decides whether to nudge the tracked currency's allocation with one limit order.
///
/// A sell is triggered once the price reaches the top of the band and a buy
/// once it reaches the bottom. Each trade moves the allocation by
/// `offset_balance`, shortened near the configured floor or ceiling so the
/// allocation never leaves `[lowest_balance, highest_balance]` in one step.
#[derive(Debug, Clone)]
pub struct RebalancingDecisionEngine {
    config: RebalanceConfig,
}

impl RebalancingDecisionEngine {
    /// Create a new engine. The configuration is expected to be validated.
    pub fn new(config: RebalanceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RebalanceConfig {
        &self.config
    }

    /// Evaluate the trigger conditions and size at most one order.
    pub fn decide(
        &self,
        balances: &BalanceSnapshot,
        band: Option<&TradeTriggerBand>,
        quote: &MarketQuote,
    ) -> Result<Decision> {
        let currency = &self.config.currency;
        let currency_balance = balances.rounded_allocation(currency)?;
        let currency_amount = balances.currency_amount(currency);

        let band = band.ok_or_else(|| RebalanceError::NoTradeHistory {
            market: self.config.target_market.clone(),
        })?;

        debug!(
            %currency,
            %currency_balance,
            %currency_amount,
            current_price = %quote.current_price,
            top_price = %band.top_price,
            bottom_price = %band.bottom_price,
            "Evaluating rebalance"
        );

        if band.contains(quote.current_price) {
            info!(
                current_price = %quote.current_price,
                last_price = %band.last_price,
                "Price inside trigger band, holding"
            );
            return Ok(Decision::Hold);
        }

        let side = if quote.current_price >= band.top_price {
            OrderSide::Sell
        } else {
            OrderSide::Buy
        };

        if currency_balance.is_zero() {
            return Err(RebalanceError::ZeroAllocation {
                currency: currency.clone(),
            });
        }

        let trade_balance = self.trade_balance(side, currency_balance);
        let size = (trade_balance / currency_balance) * currency_amount;

        if size <= quote.min_order_size {
            info!(
                side = %side,
                %size,
                min_size = %quote.min_order_size,
                "Order size at or below exchange minimum, skipping"
            );
            return Ok(Decision::DustSkipped {
                side,
                size,
                min_size: quote.min_order_size,
            });
        }

        let price = match side {
            OrderSide::Sell => quote.best_ask,
            OrderSide::Buy => quote.best_bid,
        };

        info!(
            side = %side,
            %price,
            %size,
            %trade_balance,
            "Rebalance order decided"
        );

        Ok(Decision::Place(OrderIntent::post_only_limit(
            &self.config.target_market,
            side,
            price,
            size,
        )))
    }

    /// Allocation ratio to move on `side`, clamped at the configured floor or ceiling.
    pub fn trade_balance(&self, side: OrderSide, currency_balance: Decimal) -> Decimal {
        let offset = self.config.offset_balance;
        match side {
            OrderSide::Sell => {
                if currency_balance - offset >= self.config.lowest_balance {
                    offset
                } else {
                    currency_balance - self.config.lowest_balance
                }
            }
            OrderSide::Buy => {
                if currency_balance + offset <= self.config.highest_balance {
                    offset
                } else {
                    self.config.highest_balance - currency_balance
                }
            }
        }
    }
}
