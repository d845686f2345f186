//! Mock collaborators for exercising the swap pipeline without a chain or
//! quote service
#![allow(dead_code)]

use std::{
    collections::VecDeque,
    str::FromStr,
    sync::{Arc, Mutex},
    time::Duration,
};

use alloy::{
    primitives::{Address, Bytes, TxHash, TxKind, U256, address},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde_json::{Value, json};
use swapexec::{
    chain::{ChainClient, ChainError, ChainSession, ReceiptSummary},
    engine::{ExecutionSettings, SwapOrchestrator},
    executors::ConfirmationPoller,
    quoters::{AllowanceIssue, Quote, QuoteError, QuoteParams, QuoteProvider, QuoteTransaction},
    types::{ApprovalPolicy, SwapRequest, Token},
};

/// The first anvil dev key
pub const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const CHAIN_ID: u64 = 137;
pub const SELL_TOKEN: Address = address!("0xe6a537a407488807f0bbeb0038b79004f19dddfb");
pub const BUY_TOKEN: Address = address!("0x3c499c542cef5e3811e1192ce70d8cc03d5c3359");
pub const SETTLER: Address = address!("0x0d0e364aa7852291883c162b22d6d81f6355428f");
pub const SPENDER: Address = address!("0x000000000022d473030f116ddee9f6b43ac78ba3");

pub const MINED_OK: ReceiptSummary =
    ReceiptSummary { success: true, gas_used: 150_000, block_number: Some(61_000_000) };
pub const MINED_FAILED: ReceiptSummary =
    ReceiptSummary { success: false, gas_used: 90_000, block_number: Some(61_000_000) };

// ---------------
// | Chain Mock |
// ---------------

struct ChainState {
    allowance: U256,
    allowance_reads: usize,
    gas_price: u128,
    gas_estimate: Option<u64>,
    send_error: Option<String>,
    sent: Vec<TransactionRequest>,
    scripted_receipts: VecDeque<Option<ReceiptSummary>>,
    default_receipt: Option<ReceiptSummary>,
    receipt_lookups: Vec<TxHash>,
}

/// A mock [`ChainClient`] that records every call
pub struct MockChainClient {
    state: Mutex<ChainState>,
}

impl Default for MockChainClient {
    fn default() -> Self {
        Self {
            state: Mutex::new(ChainState {
                allowance: U256::ZERO,
                allowance_reads: 0,
                gas_price: 30_000_000_000,
                gas_estimate: Some(46_000),
                send_error: None,
                sent: vec![],
                scripted_receipts: VecDeque::new(),
                default_receipt: Some(MINED_OK),
                receipt_lookups: vec![],
            }),
        }
    }
}

impl MockChainClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allowance(self, allowance: U256) -> Self {
        self.state.lock().unwrap().allowance = allowance;
        self
    }

    pub fn with_gas_estimate(self, estimate: Option<u64>) -> Self {
        self.state.lock().unwrap().gas_estimate = estimate;
        self
    }

    pub fn with_send_error(self, error: &str) -> Self {
        self.state.lock().unwrap().send_error = Some(error.to_string());
        self
    }

    /// Receipts returned by successive lookups before falling back to the
    /// default receipt
    pub fn with_receipts(self, receipts: Vec<Option<ReceiptSummary>>) -> Self {
        self.state.lock().unwrap().scripted_receipts = receipts.into();
        self
    }

    pub fn with_default_receipt(self, receipt: Option<ReceiptSummary>) -> Self {
        self.state.lock().unwrap().default_receipt = receipt;
        self
    }

    pub fn sent_transactions(&self) -> Vec<TransactionRequest> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn allowance_reads(&self) -> usize {
        self.state.lock().unwrap().allowance_reads
    }

    pub fn receipt_lookups(&self) -> Vec<TxHash> {
        self.state.lock().unwrap().receipt_lookups.clone()
    }
}

/// The hash the mock assigns to the `n`th sent transaction (1-based)
pub fn mock_tx_hash(n: usize) -> TxHash {
    TxHash::with_last_byte(n as u8)
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn allowance(
        &self,
        token: Address,
        _owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError> {
        assert_eq!(token, SELL_TOKEN);
        assert_eq!(spender, SPENDER);
        let mut state = self.state.lock().unwrap();
        state.allowance_reads += 1;
        Ok(state.allowance)
    }

    async fn gas_price(&self) -> Result<u128, ChainError> {
        Ok(self.state.lock().unwrap().gas_price)
    }

    async fn estimate_gas(&self, _tx: &TransactionRequest) -> Result<u64, ChainError> {
        self.state
            .lock()
            .unwrap()
            .gas_estimate
            .ok_or_else(|| ChainError::new("execution reverted"))
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ChainError> {
        let mut state = self.state.lock().unwrap();
        if let Some(e) = &state.send_error {
            return Err(ChainError::new(e));
        }
        state.sent.push(tx);
        Ok(mock_tx_hash(state.sent.len()))
    }

    async fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<ReceiptSummary>, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.receipt_lookups.push(tx_hash);
        let default = state.default_receipt;
        Ok(state.scripted_receipts.pop_front().unwrap_or(default))
    }
}

// ---------------
// | Quote Mock |
// ---------------

/// A mock [`QuoteProvider`] that returns a canned quote
pub struct MockQuoteProvider {
    quote: Result<Quote, QuoteError>,
    requests: Mutex<Vec<QuoteParams>>,
}

impl MockQuoteProvider {
    pub fn new(quote: Quote) -> Self {
        Self { quote: Ok(quote), requests: Mutex::new(vec![]) }
    }

    pub fn failing(error: QuoteError) -> Self {
        Self { quote: Err(error), requests: Mutex::new(vec![]) }
    }

    pub fn requests(&self) -> Vec<QuoteParams> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuoteProvider for MockQuoteProvider {
    async fn get_quote(&self, params: &QuoteParams) -> Result<Quote, QuoteError> {
        self.requests.lock().unwrap().push(params.clone());
        self.quote.clone()
    }
}

// -----------
// | Helpers |
// -----------

pub fn signer() -> PrivateKeySigner {
    TEST_KEY.parse().unwrap()
}

/// A plain quote with no allowance issue and no permit2 payload
pub fn base_quote() -> Quote {
    Quote {
        sell_amount: U256::from(1000u64),
        buy_amount: U256::from(5_412_345u64),
        transaction: QuoteTransaction {
            to: SETTLER,
            data: Bytes::from_static(&[0x1f, 0xff, 0x99, 0x1f, 0x00, 0x01]),
            value: U256::ZERO,
            gas: 288_079,
            gas_price: 33_200_000_000,
        },
        allowance_issue: None,
        permit2: None,
        sources: vec!["Uniswap_V3".to_string()],
    }
}

pub fn with_allowance_issue(mut quote: Quote) -> Quote {
    quote.allowance_issue = Some(AllowanceIssue { spender: SPENDER, actual: Some(U256::ZERO) });
    quote
}

pub fn with_permit2(mut quote: Quote) -> Quote {
    quote.permit2 = Some(permit_typed_data());
    quote
}

pub fn permit_typed_data() -> Value {
    json!({
        "types": {
            "PermitTransferFrom": [
                { "name": "permitted", "type": "TokenPermissions" },
                { "name": "spender", "type": "address" },
                { "name": "nonce", "type": "uint256" },
                { "name": "deadline", "type": "uint256" }
            ],
            "TokenPermissions": [
                { "name": "token", "type": "address" },
                { "name": "amount", "type": "uint256" }
            ],
            "EIP712Domain": [
                { "name": "name", "type": "string" },
                { "name": "chainId", "type": "uint256" },
                { "name": "verifyingContract", "type": "address" }
            ]
        },
        "domain": {
            "name": "Permit2",
            "chainId": CHAIN_ID,
            "verifyingContract": SPENDER.to_string()
        },
        "message": {
            "permitted": { "token": SELL_TOKEN.to_string(), "amount": "1000" },
            "spender": SETTLER.to_string(),
            "nonce": "1",
            "deadline": "1741100000"
        },
        "primaryType": "PermitTransferFrom"
    })
}

/// Sell 0.001 of an 6-decimal token, i.e. 1000 base units
pub fn request() -> SwapRequest {
    SwapRequest {
        sell_token: Token { symbol: "USDC".to_string(), address: SELL_TOKEN, decimals: 6 },
        buy_token: Token { symbol: "BRLA".to_string(), address: BUY_TOKEN, decimals: 18 },
        sell_amount: BigDecimal::from_str("0.001").unwrap(),
    }
}

pub fn settings(policy: ApprovalPolicy) -> ExecutionSettings {
    ExecutionSettings {
        poller: ConfirmationPoller::new(Duration::ZERO, 30),
        approval_policy: policy,
    }
}

pub fn orchestrator(
    chain: &Arc<MockChainClient>,
    quoter: &Arc<MockQuoteProvider>,
    policy: ApprovalPolicy,
) -> SwapOrchestrator {
    let session = ChainSession::new(signer(), chain.clone(), CHAIN_ID);
    SwapOrchestrator::new(session, quoter.clone(), settings(policy))
}

pub fn tx_to(tx: &TransactionRequest) -> Option<Address> {
    match tx.to {
        Some(TxKind::Call(to)) => Some(to),
        _ => None,
    }
}

pub fn tx_input(tx: &TransactionRequest) -> Bytes {
    tx.input.input().cloned().unwrap_or_default()
}
