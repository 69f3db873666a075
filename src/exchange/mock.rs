//! In-memory exchange for tests.

use super::traits::{ExchangeGateway, GatewayCall};
use super::types::*;
use crate::error::{RebalanceError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Mutable state behind the mock exchange.
#[derive(Debug, Default)]
pub struct MockExchangeState {
    pub balances: Vec<BalanceEntry>,
    pub history: Vec<HistoryEntry>,
    pub market: Option<MarketInfo>,
    /// Operations that answer with `success: false`
    pub failing: HashSet<GatewayCall>,
    /// Every call in the order it was received
    pub calls: Vec<GatewayCall>,
    pub cancelled_markets: Vec<String>,
    pub placed_orders: Vec<OrderIntent>,
}

/// Mock client that serves canned responses and records every call.
pub struct MockExchange {
    state: RwLock<MockExchangeState>,
    order_id_counter: AtomicI64,
}

impl Default for MockExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExchange {
    /// Create an empty mock with no balances, history or market.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MockExchangeState::default()),
            order_id_counter: AtomicI64::new(1),
        }
    }

    /// Add a wallet balance.
    pub fn with_balance(mut self, coin: &str, total: Decimal, usd_value: Decimal) -> Self {
        self.state.get_mut().balances.push(BalanceEntry {
            coin: coin.to_string(),
            total,
            usd_value,
        });
        self
    }

    /// Append an order to the history. Add the most recent order first.
    pub fn with_history_order(mut self, price: Decimal, filled_size: Decimal) -> Self {
        let id = self.state.get_mut().history.len() as i64 + 1;
        self.state.get_mut().history.push(HistoryEntry {
            id: Some(id),
            market: None,
            side: None,
            price: Some(price),
            avg_fill_price: None,
            filled_size: Some(filled_size),
            created_at: None,
        });
        self
    }

    /// Set the market status.
    pub fn with_market(
        mut self,
        name: &str,
        last: Decimal,
        bid: Decimal,
        ask: Decimal,
        min_provide_size: Decimal,
    ) -> Self {
        self.state.get_mut().market = Some(MarketInfo {
            name: name.to_string(),
            last: Some(last),
            bid: Some(bid),
            ask: Some(ask),
            min_provide_size: Some(min_provide_size),
        });
        self
    }

    /// Make an operation answer with a failure.
    pub fn failing_on(mut self, call: GatewayCall) -> Self {
        self.state.get_mut().failing.insert(call);
        self
    }

    /// Calls received so far, in order.
    pub async fn calls(&self) -> Vec<GatewayCall> {
        self.state.read().await.calls.clone()
    }

    pub async fn placed_orders(&self) -> Vec<OrderIntent> {
        self.state.read().await.placed_orders.clone()
    }

    pub async fn cancelled_markets(&self) -> Vec<String> {
        self.state.read().await.cancelled_markets.clone()
    }

    /// Record a call and fail it if it was configured to fail.
    async fn record(&self, call: GatewayCall) -> Result<()> {
        let mut state = self.state.write().await;
        state.calls.push(call);
        if state.failing.contains(&call) {
            debug!(call = %call, "Mock call failing on request");
            return Err(RebalanceError::gateway(call.name(), "mock failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl ExchangeGateway for MockExchange {
    async fn cancel_all_orders(&self, market: &str) -> Result<String> {
        self.record(GatewayCall::CancelAllOrders).await?;
        self.state
            .write()
            .await
            .cancelled_markets
            .push(market.to_string());
        debug!(%market, "Mock orders cancelled");
        Ok("Orders queued for cancelation".to_string())
    }

    async fn wallet_balances(&self) -> Result<Vec<BalanceEntry>> {
        self.record(GatewayCall::WalletBalances).await?;
        Ok(self.state.read().await.balances.clone())
    }

    async fn order_history(&self, market: &str) -> Result<Vec<HistoryEntry>> {
        self.record(GatewayCall::OrderHistory).await?;
        let state = self.state.read().await;
        Ok(state
            .history
            .iter()
            .filter(|entry| entry.market.as_deref().map_or(true, |m| m == market))
            .cloned()
            .collect())
    }

    async fn market(&self, market: &str) -> Result<MarketInfo> {
        self.record(GatewayCall::Market).await?;
        self.state
            .read()
            .await
            .market
            .clone()
            .filter(|info| info.name == market)
            .ok_or_else(|| {
                RebalanceError::gateway(GatewayCall::Market.name(), format!("No such market: {market}"))
            })
    }

    async fn place_order(&self, intent: &OrderIntent) -> Result<PlacedOrder> {
        self.record(GatewayCall::PlaceOrder).await?;
        let id = self.order_id_counter.fetch_add(1, Ordering::SeqCst);
        self.state.write().await.placed_orders.push(intent.clone());

        info!(
            order_id = id,
            market = %intent.market,
            side = %intent.side,
            price = %intent.price,
            size = %intent.size,
            "Mock order accepted"
        );

        Ok(PlacedOrder {
            id,
            market: intent.market.clone(),
            side: intent.side,
            price: Some(intent.price),
            size: intent.size,
            status: Some("new".to_string()),
            created_at: Some(chrono::Utc::now()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn mock() -> MockExchange {
        MockExchange::new()
            .with_balance("BTC", dec!(1), dec!(50000))
            .with_balance("USD", dec!(50000), dec!(50000))
            .with_history_order(dec!(50000), dec!(0.1))
            .with_market("BTC/USD", dec!(50100), dec!(50090), dec!(50110), dec!(0.0001))
    }

    #[tokio::test]
    async fn test_records_calls_in_order() {
        let exchange = mock();
        exchange.cancel_all_orders("BTC/USD").await.unwrap();
        exchange.wallet_balances().await.unwrap();
        exchange.market("BTC/USD").await.unwrap();

        assert_eq!(
            exchange.calls().await,
            vec![
                GatewayCall::CancelAllOrders,
                GatewayCall::WalletBalances,
                GatewayCall::Market
            ]
        );
        assert_eq!(exchange.cancelled_markets().await, vec!["BTC/USD".to_string()]);
    }

    #[tokio::test]
    async fn test_failing_call_returns_gateway_error() {
        let exchange = mock().failing_on(GatewayCall::OrderHistory);

        let err = exchange.order_history("BTC/USD").await.unwrap_err();
        assert!(matches!(
            err,
            RebalanceError::Gateway {
                operation: "order_history",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unknown_market_is_an_error() {
        let exchange = mock();
        assert!(exchange.market("ETH/USD").await.is_err());
    }

    #[tokio::test]
    async fn test_place_order_assigns_increasing_ids() {
        let exchange = mock();
        let intent = OrderIntent::post_only_limit("BTC/USD", OrderSide::Buy, dec!(50090), dec!(0.02));

        let first = exchange.place_order(&intent).await.unwrap();
        let second = exchange.place_order(&intent).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(exchange.placed_orders().await.len(), 2);
    }
}
