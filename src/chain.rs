//! On-chain access for a swap attempt
//!
//! The pipeline talks to the chain only through the [`ChainClient`] trait.
//! [`AlloyChainClient`] implements it over an alloy provider that signs with
//! the session wallet.

use std::sync::Arc;

use alloy::{
    network::EthereumWallet,
    primitives::{Address, TxHash, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    sol,
};
use async_trait::async_trait;

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 value) external returns (bool);
    }
}

/// An error returned by the chain client
#[derive(Debug, Clone, thiserror::Error)]
#[error("on-chain error: {0}")]
pub struct ChainError(pub String);

impl ChainError {
    /// Create a new chain error
    #[allow(clippy::needless_pass_by_value)]
    pub fn new<T: ToString>(e: T) -> Self {
        ChainError(e.to_string())
    }
}

/// The parts of a transaction receipt the pipeline inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptSummary {
    /// Whether the transaction executed successfully
    pub success: bool,
    /// Gas consumed by the transaction
    pub gas_used: u64,
    /// The block the transaction was mined in
    pub block_number: Option<u64>,
}

/// Read and write access to the chain for one wallet
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// The ERC-20 allowance `owner` has granted `spender` on `token`
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError>;

    /// The current network gas price, in wei
    async fn gas_price(&self) -> Result<u128, ChainError>;

    /// Estimate the gas needed by a transaction
    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, ChainError>;

    /// Sign and broadcast a transaction, returning its hash
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ChainError>;

    /// Look up a receipt; `None` while the transaction is unmined
    async fn transaction_receipt(&self, tx_hash: TxHash)
    -> Result<Option<ReceiptSummary>, ChainError>;
}

/// A [`ChainClient`] backed by an alloy provider with a wallet filler
#[derive(Clone)]
pub struct AlloyChainClient {
    provider: DynProvider,
}

impl AlloyChainClient {
    /// Connect to `rpc_url`, signing with `signer`
    ///
    /// Fails if the node serves a chain other than `chain_id`.
    pub async fn connect(
        rpc_url: &str,
        signer: PrivateKeySigner,
        chain_id: u64,
    ) -> Result<Self, ChainError> {
        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect(rpc_url)
            .await
            .map_err(ChainError::new)?
            .erased();

        let remote_chain_id = provider.get_chain_id().await.map_err(ChainError::new)?;
        if remote_chain_id != chain_id {
            return Err(ChainError::new(format!(
                "rpc serves chain {remote_chain_id}, expected chain {chain_id}"
            )));
        }

        Ok(Self { provider })
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError> {
        IERC20::new(token, &self.provider)
            .allowance(owner, spender)
            .call()
            .await
            .map_err(ChainError::new)
    }

    async fn gas_price(&self) -> Result<u128, ChainError> {
        self.provider.get_gas_price().await.map_err(ChainError::new)
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64, ChainError> {
        self.provider.estimate_gas(tx.clone()).await.map_err(ChainError::new)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ChainError> {
        let pending = self.provider.send_transaction(tx).await.map_err(ChainError::new)?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<ReceiptSummary>, ChainError> {
        let receipt =
            self.provider.get_transaction_receipt(tx_hash).await.map_err(ChainError::new)?;

        Ok(receipt.map(|r| ReceiptSummary {
            success: r.status(),
            gas_used: r.gas_used,
            block_number: r.block_number,
        }))
    }
}

/// The wallet and chain connection shared by every step of a swap attempt
///
/// Constructed once and passed by reference; nothing in it changes after
/// construction.
#[derive(Clone)]
pub struct ChainSession {
    signer: PrivateKeySigner,
    client: Arc<dyn ChainClient>,
    chain_id: u64,
}

impl ChainSession {
    /// Create a new session
    pub fn new(signer: PrivateKeySigner, client: Arc<dyn ChainClient>, chain_id: u64) -> Self {
        Self { signer, client, chain_id }
    }

    /// Create a session from a hex private key, connecting over `rpc_url`
    pub async fn connect(private_key: &str, rpc_url: &str, chain_id: u64) -> anyhow::Result<Self> {
        let signer = private_key.parse::<PrivateKeySigner>()?;
        let client = AlloyChainClient::connect(rpc_url, signer.clone(), chain_id).await?;
        Ok(Self::new(signer, Arc::new(client), chain_id))
    }

    /// The wallet address
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// The wallet signer
    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    /// The chain client
    pub fn client(&self) -> &dyn ChainClient {
        self.client.as_ref()
    }

    /// The chain id transactions are signed for
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}
