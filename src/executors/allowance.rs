//! ERC-20 allowance reconciliation ahead of a swap

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, TxHash, U256},
    rpc::types::TransactionRequest,
    sol_types::SolCall,
};
use tracing::{info, instrument, warn};

use crate::{
    chain::{ChainError, ChainSession, IERC20},
    error::SwapError,
    executors::confirmation::ConfirmationPoller,
};

/// Gas limit used when an approval cannot be estimated
pub const FALLBACK_APPROVAL_GAS_LIMIT: u64 = 100_000;

/// Add a 30% buffer to an approval gas estimate
pub fn buffered_approval_gas(estimate: u64) -> u64 {
    u64::try_from(u128::from(estimate) * 13 / 10).unwrap_or(u64::MAX)
}

/// Choose the approval gas limit from an estimation result
pub fn approval_gas_limit(estimate: Result<u64, ChainError>) -> u64 {
    match estimate {
        Ok(estimate) => {
            let limit = buffered_approval_gas(estimate);
            info!("estimated approval gas: {estimate}, limit with buffer: {limit}");
            limit
        },
        Err(e) => {
            warn!("approval gas estimation failed ({e}), using {FALLBACK_APPROVAL_GAS_LIMIT}");
            FALLBACK_APPROVAL_GAS_LIMIT
        },
    }
}

/// Ensures a spender may move the wallet's sell tokens
#[derive(Clone)]
pub struct AllowanceManager {
    session: ChainSession,
    poller: ConfirmationPoller,
}

impl AllowanceManager {
    pub fn new(session: ChainSession, poller: ConfirmationPoller) -> Self {
        Self { session, poller }
    }

    /// Approve `spender` for `required` of `token` if the current allowance
    /// falls short, waiting for the approval to be mined
    ///
    /// Returns the approval transaction hash, or `None` if none was needed.
    #[instrument(skip(self))]
    pub async fn ensure_allowance(
        &self,
        token: Address,
        spender: Address,
        required: U256,
    ) -> Result<Option<TxHash>, SwapError> {
        let owner = self.session.address();
        let client = self.session.client();

        let current = client
            .allowance(token, owner, spender)
            .await
            .map_err(|e| SwapError::approval(None, format!("reading allowance: {e}")))?;
        info!("current allowance: {current}");

        if current >= required {
            info!("allowance is sufficient, no approval needed");
            return Ok(None);
        }

        let gas_price = client
            .gas_price()
            .await
            .map_err(|e| SwapError::approval(None, format!("reading gas price: {e}")))?;
        info!("current gas price: {gas_price} wei");

        let calldata = IERC20::approveCall { spender, value: required }.abi_encode();
        let tx = TransactionRequest::default()
            .with_from(owner)
            .with_to(token)
            .with_input(calldata)
            .with_chain_id(self.session.chain_id());
        let gas_limit = approval_gas_limit(client.estimate_gas(&tx).await);
        let tx = tx.with_gas_limit(gas_limit).with_gas_price(gas_price);

        let tx_hash = client
            .send_transaction(tx)
            .await
            .map_err(|e| SwapError::approval(None, format!("sending approval: {e}")))?;
        info!("approval transaction sent: {tx_hash:#x}");

        self.poller
            .wait_for_receipt(client, tx_hash)
            .await
            .map_err(|e| SwapError::approval(Some(tx_hash), e))?;

        info!("token approval successful");
        Ok(Some(tx_hash))
    }
}
