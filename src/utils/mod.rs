//! Shared utilities.

mod decimal;

pub use decimal::{round_ratio, to_percent};
