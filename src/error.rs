//! Error types for a swap attempt

use alloy::primitives::TxHash;

/// An error that terminates a swap attempt
#[derive(Debug, Clone, thiserror::Error)]
pub enum SwapError {
    /// The sell amount could not be converted to base units
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    /// The quote service did not return a usable quote
    #[error("quote unavailable: {0}")]
    QuoteUnavailable(String),
    /// The quote's Permit2 typed data is missing required fields
    #[error("malformed permit2 data: {0}")]
    MalformedPermitData(String),
    /// The Permit2 typed data could not be signed
    #[error("signing failed: {0}")]
    SigningFailed(String),
    /// The allowance could not be brought up to the required amount
    #[error("approval failed{}: {reason}", fmt_tx(.tx_hash))]
    ApprovalFailed {
        /// The approval transaction, if one was broadcast
        tx_hash: Option<TxHash>,
        /// Why the approval failed
        reason: String,
    },
    /// The swap transaction could not be submitted
    #[error("submission failed: {0}")]
    SubmissionFailed(String),
    /// The transaction was mined but reverted
    #[error("transaction {tx_hash:#x} reverted on-chain (gas used: {gas_used})")]
    Reverted {
        /// The reverted transaction
        tx_hash: TxHash,
        /// The gas consumed by the reverted transaction
        gas_used: u64,
    },
    /// No receipt appeared within the polling budget
    #[error(
        "transaction {tx_hash:#x} not mined after {attempts} attempts; it may still confirm later"
    )]
    TimedOut {
        /// The pending transaction
        tx_hash: TxHash,
        /// The number of receipt lookups performed
        attempts: u32,
    },
}

impl SwapError {
    /// Create a new invalid amount error
    #[allow(clippy::needless_pass_by_value)]
    pub fn invalid_amount<T: ToString>(e: T) -> Self {
        SwapError::InvalidAmount(e.to_string())
    }

    /// Create a new quote unavailable error
    #[allow(clippy::needless_pass_by_value)]
    pub fn quote_unavailable<T: ToString>(e: T) -> Self {
        SwapError::QuoteUnavailable(e.to_string())
    }

    /// Create a new malformed permit data error
    #[allow(clippy::needless_pass_by_value)]
    pub fn malformed_permit<T: ToString>(e: T) -> Self {
        SwapError::MalformedPermitData(e.to_string())
    }

    /// Create a new signing error
    #[allow(clippy::needless_pass_by_value)]
    pub fn signing<T: ToString>(e: T) -> Self {
        SwapError::SigningFailed(e.to_string())
    }

    /// Create a new submission error
    #[allow(clippy::needless_pass_by_value)]
    pub fn submission<T: ToString>(e: T) -> Self {
        SwapError::SubmissionFailed(e.to_string())
    }

    /// Create a new approval error
    #[allow(clippy::needless_pass_by_value)]
    pub fn approval<T: ToString>(tx_hash: Option<TxHash>, e: T) -> Self {
        SwapError::ApprovalFailed { tx_hash, reason: e.to_string() }
    }

    /// The transaction hash associated with the failure, if any
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            SwapError::ApprovalFailed { tx_hash, .. } => *tx_hash,
            SwapError::Reverted { tx_hash, .. } | SwapError::TimedOut { tx_hash, .. } => {
                Some(*tx_hash)
            },
            _ => None,
        }
    }
}

fn fmt_tx(tx_hash: &Option<TxHash>) -> String {
    tx_hash.map(|h| format!(" (tx {h:#x})")).unwrap_or_default()
}
