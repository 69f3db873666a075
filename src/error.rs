//! Error taxonomy for a rebalancing cycle.
//!
//! Every variant is fatal for the current cycle. A skipped dust order is not
//! an error and is reported through [`crate::strategy::Decision`] instead.

/// Errors that abort a rebalancing cycle.
#[derive(Debug, thiserror::Error)]
pub enum RebalanceError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Gateway error ({operation}): {message}")]
    Gateway {
        operation: &'static str,
        message: String,
    },

    #[error("No filled order in {market} history to anchor the trigger band")]
    NoTradeHistory { market: String },

    #[error("Allocation of {currency} is zero, cannot size a rebalancing order")]
    ZeroAllocation { currency: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}

impl RebalanceError {
    pub(crate) fn gateway(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Gateway {
            operation,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RebalanceError>;
