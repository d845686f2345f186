//! Waiting for a submitted transaction to be mined

use std::time::Duration;

use alloy::primitives::TxHash;
use tracing::{debug, info, warn};

use crate::{
    chain::{ChainClient, ReceiptSummary},
    error::SwapError,
};

/// The default delay between receipt lookups
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// The default number of receipt lookups before giving up
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 30;

/// The lifecycle of a submitted transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationState {
    /// Broadcast, not yet looked up
    Submitted,
    /// Looked up `attempts` times without a receipt
    Pending {
        /// Receipt lookups so far
        attempts: u32,
    },
    /// Mined with a success status
    Confirmed(ReceiptSummary),
    /// Mined with a failure status
    Reverted(ReceiptSummary),
    /// No receipt within the lookup budget
    TimedOut {
        /// Receipt lookups performed
        attempts: u32,
    },
}

impl ConfirmationState {
    /// Whether polling has finished
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConfirmationState::Confirmed(_)
                | ConfirmationState::Reverted(_)
                | ConfirmationState::TimedOut { .. }
        )
    }

    /// Apply the result of one receipt lookup
    pub fn advance(self, receipt: Option<ReceiptSummary>, max_attempts: u32) -> Self {
        let attempts = match self {
            ConfirmationState::Submitted => 1,
            ConfirmationState::Pending { attempts } => attempts + 1,
            terminal => return terminal,
        };

        match receipt {
            Some(receipt) if receipt.success => ConfirmationState::Confirmed(receipt),
            Some(receipt) => ConfirmationState::Reverted(receipt),
            None if attempts >= max_attempts => ConfirmationState::TimedOut { attempts },
            None => ConfirmationState::Pending { attempts },
        }
    }
}

/// Polls for transaction receipts at a fixed interval with a bounded budget
#[derive(Debug, Clone, Copy)]
pub struct ConfirmationPoller {
    /// Delay between lookups
    interval: Duration,
    /// Lookups before declaring the transaction timed out
    max_attempts: u32,
}

impl Default for ConfirmationPoller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_MAX_POLL_ATTEMPTS)
    }
}

impl ConfirmationPoller {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self { interval, max_attempts }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Poll until the transaction is mined or the budget is spent
    ///
    /// A failed lookup counts as an attempt without a receipt.
    pub async fn wait_for_receipt(
        &self,
        client: &dyn ChainClient,
        tx_hash: TxHash,
    ) -> Result<ReceiptSummary, SwapError> {
        let mut state = ConfirmationState::Submitted;
        loop {
            let receipt = match client.transaction_receipt(tx_hash).await {
                Ok(receipt) => receipt,
                Err(e) => {
                    warn!("receipt lookup for {tx_hash:#x} failed: {e}");
                    None
                },
            };

            state = state.advance(receipt, self.max_attempts);
            match state {
                ConfirmationState::Confirmed(receipt) => {
                    info!("tx {tx_hash:#x} confirmed, gas used: {}", receipt.gas_used);
                    return Ok(receipt);
                },
                ConfirmationState::Reverted(receipt) => {
                    warn!("tx {tx_hash:#x} reverted, gas used: {}", receipt.gas_used);
                    return Err(SwapError::Reverted { tx_hash, gas_used: receipt.gas_used });
                },
                ConfirmationState::TimedOut { attempts } => {
                    return Err(SwapError::TimedOut { tx_hash, attempts });
                },
                ConfirmationState::Pending { attempts } => {
                    debug!("waiting for receipt... attempt {attempts}/{}", self.max_attempts);
                    tokio::time::sleep(self.interval).await;
                },
                // `advance` never returns to the initial state
                ConfirmationState::Submitted => tokio::time::sleep(self.interval).await,
            }
        }
    }
}
