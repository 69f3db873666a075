//! Type definitions for exchange REST API requests and responses.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Envelope wrapping every REST response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Wallet balance for a single coin.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceEntry {
    pub coin: String,
    /// Total amount held, including amounts locked in orders
    pub total: Decimal,
    /// USD-equivalent value of `total`
    pub usd_value: Decimal,
}

/// Historical order, as returned most-recent-first by the order history endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub side: Option<OrderSide>,
    /// Limit price (null for market orders)
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub avg_fill_price: Option<Decimal>,
    /// Amount filled so far (null for orders that never traded)
    #[serde(default)]
    pub filled_size: Option<Decimal>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl HistoryEntry {
    /// Price the order traded at, preferring the limit price.
    pub fn reference_price(&self) -> Option<Decimal> {
        self.price.or(self.avg_fill_price)
    }

    pub fn is_filled(&self) -> bool {
        self.filled_size.is_some_and(|size| size > Decimal::ZERO)
    }
}

/// Single market status.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketInfo {
    pub name: String,
    /// Last traded price
    #[serde(default)]
    pub last: Option<Decimal>,
    #[serde(default)]
    pub bid: Option<Decimal>,
    #[serde(default)]
    pub ask: Option<Decimal>,
    /// Minimum size accepted for a resting (post-only) order
    #[serde(default)]
    pub min_provide_size: Option<Decimal>,
}

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Limit,
}

/// Request body for cancelling every open order on a market.
#[derive(Debug, Clone, Serialize)]
pub struct CancelAllRequest<'a> {
    pub market: &'a str,
}

/// Order to submit, serialized as the order placement body.
///
/// Built by the decision engine and discarded once submitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIntent {
    pub market: String,
    pub side: OrderSide,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    #[serde(with = "rust_decimal::serde::float")]
    pub size: Decimal,
    pub reduce_only: bool,
    /// Immediate-or-cancel
    pub ioc: bool,
    pub post_only: bool,
    pub client_id: Option<String>,
}

impl OrderIntent {
    /// Resting limit order that only ever adds liquidity.
    pub fn post_only_limit(market: &str, side: OrderSide, price: Decimal, size: Decimal) -> Self {
        Self {
            market: market.to_string(),
            side,
            price,
            order_type: OrderType::Limit,
            size,
            reduce_only: false,
            ioc: false,
            post_only: true,
            client_id: None,
        }
    }
}

/// Order accepted by the exchange.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub id: i64,
    pub market: String,
    pub side: OrderSide,
    #[serde(default)]
    pub price: Option<Decimal>,
    pub size: Decimal,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
