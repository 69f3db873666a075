//! # Spot Rebalancer
//!
//! Keeps the allocation of one currency inside a configured band by placing
//! at most one post-only limit order per scheduled run.
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `error`: Error taxonomy for a rebalancing cycle
//! - `exchange`: Exchange gateway trait, signed REST client
//! - `strategy`: Balance/market snapshots, decision engine and cycle
//! - `utils`: Shared utilities and decimal arithmetic

pub mod config;
pub mod error;
pub mod exchange;
pub mod strategy;
pub mod utils;

pub use config::Config;
pub use error::RebalanceError;
