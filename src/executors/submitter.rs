//! Building and broadcasting the swap transaction

use alloy::{
    network::TransactionBuilder,
    primitives::{Bytes, TxHash, U256},
    rpc::types::TransactionRequest,
};
use tracing::{debug, info, instrument};

use crate::{
    chain::ChainSession, error::SwapError, quoters::QuoteTransaction,
    signing::Permit2Signature,
};

/// Add a 20% buffer to the quote's gas estimate
pub fn buffered_swap_gas(estimate: u64) -> u64 {
    u64::try_from(u128::from(estimate) * 12 / 10).unwrap_or(u64::MAX)
}

/// Append a signature to calldata as `data || pad32(len) || signature`
pub fn append_signature(data: &[u8], signature: &[u8]) -> Bytes {
    let length = U256::from(signature.len()).to_be_bytes::<32>();

    let mut calldata = Vec::with_capacity(data.len() + length.len() + signature.len());
    calldata.extend_from_slice(data);
    calldata.extend_from_slice(&length);
    calldata.extend_from_slice(signature);
    calldata.into()
}

/// Signs and broadcasts swap transactions from the session wallet
#[derive(Clone)]
pub struct TransactionSubmitter {
    session: ChainSession,
}

impl TransactionSubmitter {
    pub fn new(session: ChainSession) -> Self {
        Self { session }
    }

    /// Build the swap transaction, appending the permit2 signature if given
    pub fn build_swap_tx(
        &self,
        quote_tx: &QuoteTransaction,
        signature: Option<&Permit2Signature>,
    ) -> TransactionRequest {
        let data = match signature {
            Some(signature) => append_signature(&quote_tx.data, signature.as_bytes()),
            None => quote_tx.data.clone(),
        };

        TransactionRequest::default()
            .with_from(self.session.address())
            .with_to(quote_tx.to)
            .with_input(data)
            .with_value(quote_tx.value)
            .with_gas_limit(buffered_swap_gas(quote_tx.gas))
            .with_gas_price(quote_tx.gas_price)
            .with_chain_id(self.session.chain_id())
    }

    /// Build and broadcast the swap transaction
    #[instrument(skip_all, fields(to = %quote_tx.to, permit2 = signature.is_some()))]
    pub async fn submit(
        &self,
        quote_tx: &QuoteTransaction,
        signature: Option<&Permit2Signature>,
    ) -> Result<TxHash, SwapError> {
        let tx = self.build_swap_tx(quote_tx, signature);
        if signature.is_some() {
            debug!("calldata with appended signature: {:?}", tx.input.input());
        }

        let tx_hash =
            self.session.client().send_transaction(tx).await.map_err(SwapError::submission)?;
        info!("swap transaction sent: {tx_hash:#x}");
        Ok(tx_hash)
    }
}
