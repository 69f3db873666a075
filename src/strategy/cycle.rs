//! One rebalancing cycle against an exchange gateway.
//!
//! Stages run strictly in order and the first failure aborts the cycle:
//! cancel open orders, read balances, read order history, read the market,
//! decide, place.

use crate::config::RebalanceConfig;
use crate::error::{RebalanceError, Result};
use crate::exchange::{ExchangeGateway, OrderIntent, OrderSide, PlacedOrder};
use crate::strategy::engine::{Decision, RebalancingDecisionEngine};
use crate::strategy::snapshot::{BalanceSnapshot, MarketQuote, TradeTriggerBand};
use crate::utils::to_percent;
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

/// How a completed cycle ended. Every variant is a success.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// Price inside the trigger band, nothing to do
    Hold,
    /// Trade triggered but too small for the exchange
    DustSkipped {
        side: OrderSide,
        size: Decimal,
        min_size: Decimal,
    },
    /// Order submitted
    OrderPlaced(PlacedOrder),
    /// Dry run: order decided but not submitted
    WouldPlace(OrderIntent),
}

/// Runs a single rebalancing cycle.
pub struct RebalanceCycle<'a, G: ExchangeGateway + ?Sized> {
    gateway: &'a G,
    engine: RebalancingDecisionEngine,
    dry_run: bool,
}

impl<'a, G: ExchangeGateway + ?Sized> RebalanceCycle<'a, G> {
    pub fn new(gateway: &'a G, config: RebalanceConfig) -> Self {
        Self {
            gateway,
            engine: RebalancingDecisionEngine::new(config),
            dry_run: false,
        }
    }

    /// Skip the cancel and place calls, only report the decision.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[instrument(skip(self), fields(market = %self.engine.config().target_market, dry_run = self.dry_run))]
    pub async fn run(&self) -> Result<CycleOutcome> {
        let config = self.engine.config();
        let market = config.target_market.as_str();

        if self.dry_run {
            info!("Dry run, leaving open orders in place");
        } else {
            let result = self.gateway.cancel_all_orders(market).await?;
            info!(%result, "Open orders cancelled");
        }

        let balances = BalanceSnapshot::new(self.gateway.wallet_balances().await?);
        let allocation = balances.rounded_allocation(&config.currency)?;
        info!(
            currency = %config.currency,
            allocation_pct = %to_percent(allocation),
            amount = %balances.currency_amount(&config.currency),
            total_usd = %balances.sum_usd_value(),
            "Wallet balances"
        );

        let history = self.gateway.order_history(market).await?;
        let band = TradeTriggerBand::from_history(&history, config.offset_price_percent)
            .ok_or_else(|| RebalanceError::NoTradeHistory {
                market: market.to_string(),
            })?;
        info!(
            last_price = %band.last_price,
            top_price = %band.top_price,
            bottom_price = %band.bottom_price,
            "Trigger band"
        );

        let info = self.gateway.market(market).await?;
        let quote = MarketQuote::try_from(&info)?;
        info!(
            current_price = %quote.current_price,
            best_bid = %quote.best_bid,
            best_ask = %quote.best_ask,
            min_size = %quote.min_order_size,
            "Market status"
        );

        match self.engine.decide(&balances, Some(&band), &quote)? {
            Decision::Hold => Ok(CycleOutcome::Hold),
            Decision::DustSkipped {
                side,
                size,
                min_size,
            } => Ok(CycleOutcome::DustSkipped {
                side,
                size,
                min_size,
            }),
            Decision::Place(intent) if self.dry_run => {
                warn!(
                    side = %intent.side,
                    price = %intent.price,
                    size = %intent.size,
                    "Dry run, order not submitted"
                );
                Ok(CycleOutcome::WouldPlace(intent))
            }
            Decision::Place(intent) => {
                let placed = self.gateway.place_order(&intent).await?;
                info!(
                    order_id = placed.id,
                    side = %placed.side,
                    price = %intent.price,
                    size = %placed.size,
                    "Order placed"
                );
                Ok(CycleOutcome::OrderPlaced(placed))
            }
        }
    }
}
