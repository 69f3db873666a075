//! Immutable per-cycle views of the account and market.
//!
//! Raw gateway records are validated into these types before they reach the
//! decision engine.

use crate::error::{RebalanceError, Result};
use crate::exchange::{BalanceEntry, GatewayCall, HistoryEntry, MarketInfo};
use crate::utils::round_ratio;
use rust_decimal::Decimal;

/// Number of decimal places kept on the allocation ratio.
pub const ALLOCATION_PRECISION: u32 = 4;

/// Wallet holdings with a positive total, valued in USD.
#[derive(Debug, Clone)]
pub struct BalanceSnapshot {
    entries: Vec<BalanceEntry>,
}

impl BalanceSnapshot {
    /// Build a snapshot, dropping coins whose total is not positive.
    pub fn new(entries: Vec<BalanceEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .filter(|entry| entry.total > Decimal::ZERO)
                .collect(),
        }
    }

    /// Total USD value of the account.
    pub fn sum_usd_value(&self) -> Decimal {
        self.entries.iter().map(|entry| entry.usd_value).sum()
    }

    fn entry(&self, currency: &str) -> Option<&BalanceEntry> {
        self.entries.iter().find(|entry| entry.coin == currency)
    }

    /// USD value held in `currency`, zero if the coin is absent.
    pub fn currency_usd_value(&self, currency: &str) -> Decimal {
        self.entry(currency)
            .map(|entry| entry.usd_value)
            .unwrap_or(Decimal::ZERO)
    }

    /// Amount of `currency` held, zero if the coin is absent.
    pub fn currency_amount(&self, currency: &str) -> Decimal {
        self.entry(currency)
            .map(|entry| entry.total)
            .unwrap_or(Decimal::ZERO)
    }

    /// Share of the account value held in `currency`, unrounded.
    pub fn currency_allocation(&self, currency: &str) -> Result<Decimal> {
        let sum = self.sum_usd_value();
        if sum <= Decimal::ZERO {
            return Err(RebalanceError::InsufficientData(format!(
                "total USD value of the account is {sum}, cannot compute {currency} allocation"
            )));
        }
        Ok(self.currency_usd_value(currency) / sum)
    }

    /// Allocation rounded to [`ALLOCATION_PRECISION`] decimal places.
    pub fn rounded_allocation(&self, currency: &str) -> Result<Decimal> {
        self.currency_allocation(currency)
            .map(|ratio| round_ratio(ratio, ALLOCATION_PRECISION))
    }
}

/// Price interval around the last fill outside of which the agent trades.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeTriggerBand {
    pub last_price: Decimal,
    pub top_price: Decimal,
    pub bottom_price: Decimal,
}

impl TradeTriggerBand {
    pub fn around(last_price: Decimal, offset_price_percent: Decimal) -> Self {
        Self {
            last_price,
            top_price: last_price * (Decimal::ONE + offset_price_percent),
            bottom_price: last_price * (Decimal::ONE - offset_price_percent),
        }
    }

    /// Band around the most recent filled order in a most-recent-first history.
    ///
    /// Returns `None` when no order in the history was ever filled.
    pub fn from_history(history: &[HistoryEntry], offset_price_percent: Decimal) -> Option<Self> {
        history
            .iter()
            .filter(|entry| entry.is_filled())
            .find_map(HistoryEntry::reference_price)
            .map(|price| Self::around(price, offset_price_percent))
    }

    /// Whether `price` lies strictly inside the band.
    pub fn contains(&self, price: Decimal) -> bool {
        price > self.bottom_price && price < self.top_price
    }
}

/// Current market state for the traded pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketQuote {
    pub current_price: Decimal,
    pub best_bid: Decimal,
    pub best_ask: Decimal,
    pub min_order_size: Decimal,
}

impl TryFrom<&MarketInfo> for MarketQuote {
    type Error = RebalanceError;

    fn try_from(info: &MarketInfo) -> Result<Self> {
        let positive = |field: &str, value: Option<Decimal>| match value {
            Some(v) if v > Decimal::ZERO => Ok(v),
            other => Err(RebalanceError::gateway(
                GatewayCall::Market.name(),
                format!("{} has invalid {field}: {other:?}", info.name),
            )),
        };

        Ok(Self {
            current_price: positive("last", info.last)?,
            best_bid: positive("bid", info.bid)?,
            best_ask: positive("ask", info.ask)?,
            min_order_size: positive("minProvideSize", info.min_provide_size)?,
        })
    }
}
