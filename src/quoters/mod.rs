//! Swap quote sourcing
//!
//! The pipeline consumes quotes through the [`QuoteProvider`] trait; the 0x
//! HTTP implementation lives in [`zeroex`].

use alloy::primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use serde_json::Value;

pub mod api_types;
pub mod zeroex;

/// An error fetching or parsing a quote
#[derive(Debug, Clone, thiserror::Error)]
pub enum QuoteError {
    /// The request failed or returned a non-success status
    #[error("http error: {0}")]
    Http(String),
    /// The response body could not be interpreted
    #[error("parse error: {0}")]
    Parse(String),
}

impl QuoteError {
    /// Create a new http error
    #[allow(clippy::needless_pass_by_value)]
    pub fn http<T: ToString>(e: T) -> Self {
        QuoteError::Http(e.to_string())
    }

    /// Create a new parse error
    #[allow(clippy::needless_pass_by_value)]
    pub fn parse<T: ToString>(e: T) -> Self {
        QuoteError::Parse(e.to_string())
    }
}

impl From<reqwest::Error> for QuoteError {
    fn from(e: reqwest::Error) -> Self {
        QuoteError::http(e)
    }
}

/// The parameters of a quote request
#[derive(Debug, Clone)]
pub struct QuoteParams {
    /// The token being sold
    pub sell_token: Address,
    /// The token being bought
    pub buy_token: Address,
    /// The amount being sold, in base units of the sell token
    pub sell_amount: U256,
    /// The address that will submit the swap
    pub taker: Address,
}

/// The swap transaction a quote asks the taker to submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteTransaction {
    /// The settlement contract
    pub to: Address,
    /// Unsigned calldata; a permit2 signature is appended, never merged in
    pub data: Bytes,
    /// Native value to send
    pub value: U256,
    /// The quote service's gas estimate
    pub gas: u64,
    /// The gas price to submit with, in wei
    pub gas_price: u128,
}

/// An allowance shortfall reported by the quote service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowanceIssue {
    /// The address that needs an allowance on the sell token
    pub spender: Address,
    /// The allowance the quote service observed
    pub actual: Option<U256>,
}

/// A quote for a single swap attempt
#[derive(Debug, Clone)]
pub struct Quote {
    /// The amount sold, in base units
    pub sell_amount: U256,
    /// The amount bought, in base units
    pub buy_amount: U256,
    /// The transaction to submit
    pub transaction: QuoteTransaction,
    /// Present when the spender's allowance is insufficient
    pub allowance_issue: Option<AllowanceIssue>,
    /// EIP-712 typed data to sign, present on permit2 quotes
    pub permit2: Option<Value>,
    /// Liquidity sources the quote routes through
    pub sources: Vec<String>,
}

/// A source of swap quotes
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetch a quote for the given parameters
    async fn get_quote(&self, params: &QuoteParams) -> Result<Quote, QuoteError>;
}
