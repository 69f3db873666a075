//! Exchange integration for the rebalancer.
//!
//! Provides REST connectivity for:
//! - Account state (wallet balances, order history)
//! - Market data (last price, best bid/ask, minimum size)
//! - Order management (cancel all, place limit order)
//!
//! Tests run the same gateway trait against an in-memory mock exchange.

mod client;
#[cfg(test)]
mod mock;
mod traits;
mod types;

pub use client::FtxClient;
#[cfg(test)]
pub use mock::MockExchange;
#[cfg(test)]
pub use traits::MockExchangeGateway;
pub use traits::{ExchangeGateway, GatewayCall};
pub use types::*;
