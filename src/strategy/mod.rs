//! Rebalancing strategy.
//!
//! Contains the core logic for:
//! - Validated per-cycle snapshots of balances, trade history and market
//! - The allocation rebalancing decision
//! - The ordered cycle that feeds the decision and submits its order

mod cycle;
mod engine;
mod snapshot;

pub use cycle::{CycleOutcome, RebalanceCycle};
pub use engine::{Decision, RebalancingDecisionEngine};
pub use snapshot::{BalanceSnapshot, MarketQuote, TradeTriggerBand, ALLOCATION_PRECISION};
