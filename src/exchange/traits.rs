//! Exchange gateway abstraction.
//!
//! The rebalancing cycle only talks to the exchange through this trait, so the
//! signed REST client and the in-memory mock are interchangeable.

use async_trait::async_trait;
use std::fmt;

use super::types::{BalanceEntry, HistoryEntry, MarketInfo, OrderIntent, PlacedOrder};
use crate::error::Result;

/// Operations a rebalancing cycle needs from an exchange.
///
/// Every method performs exactly one request. A non-success response is
/// returned as [`crate::RebalanceError::Gateway`]; nothing is retried.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    /// Cancel every open order on `market`.
    async fn cancel_all_orders(&self, market: &str) -> Result<String>;

    /// Fetch balances for every coin in the account.
    async fn wallet_balances(&self) -> Result<Vec<BalanceEntry>>;

    /// Fetch order history for `market`, most recent first.
    async fn order_history(&self, market: &str) -> Result<Vec<HistoryEntry>>;

    /// Fetch the current status of `market`.
    async fn market(&self, market: &str) -> Result<MarketInfo>;

    /// Submit an order.
    async fn place_order(&self, intent: &OrderIntent) -> Result<PlacedOrder>;
}

/// Identifies a gateway operation in errors and call logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayCall {
    CancelAllOrders,
    WalletBalances,
    OrderHistory,
    Market,
    PlaceOrder,
}

impl GatewayCall {
    pub fn name(&self) -> &'static str {
        match self {
            GatewayCall::CancelAllOrders => "cancel_all_orders",
            GatewayCall::WalletBalances => "wallet_balances",
            GatewayCall::OrderHistory => "order_history",
            GatewayCall::Market => "market",
            GatewayCall::PlaceOrder => "place_order",
        }
    }

    /// Whether the call changes account state.
    pub fn is_mutating(&self) -> bool {
        matches!(self, GatewayCall::CancelAllOrders | GatewayCall::PlaceOrder)
    }
}

impl fmt::Display for GatewayCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutating_calls() {
        assert!(GatewayCall::CancelAllOrders.is_mutating());
        assert!(GatewayCall::PlaceOrder.is_mutating());
        assert!(!GatewayCall::WalletBalances.is_mutating());
        assert!(!GatewayCall::OrderHistory.is_mutating());
        assert!(!GatewayCall::Market.is_mutating());
    }

    #[test]
    fn test_call_display() {
        assert_eq!(GatewayCall::OrderHistory.to_string(), "order_history");
    }
}
