//! 0x swap API (v2, permit2 flavour) response types
//!
//! Only the fields consumed by the swap pipeline are modelled. Numeric fields
//! arrive as decimal strings and are parsed when converting into a [`Quote`].

use std::str::FromStr;

use alloy::primitives::{Address, Bytes, U256};
use serde::Deserialize;
use serde_json::Value;

use super::{AllowanceIssue, Quote, QuoteError, QuoteTransaction};

/// Raw quote response returned by `GET /swap/permit2/quote`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZeroExQuote {
    /// Amount of the sell token, in base units
    pub sell_amount: String,
    /// Amount of the buy token, in base units
    pub buy_amount: String,
    /// The transaction to submit
    pub transaction: ZeroExTransaction,
    /// Problems the quote service detected for the taker
    #[serde(default)]
    pub issues: Option<ZeroExIssues>,
    /// Permit2 signing payload, present when the taker must sign
    #[serde(default)]
    pub permit2: Option<ZeroExPermit2>,
    /// The route the quote fills through
    #[serde(default)]
    pub route: Option<ZeroExRoute>,
}

/// The transaction portion of a quote
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZeroExTransaction {
    /// The settlement contract
    pub to: String,
    /// Hex-encoded calldata
    pub data: String,
    /// Native value to send
    #[serde(default)]
    pub value: Option<String>,
    /// Estimated gas limit
    #[serde(default)]
    pub gas: Option<String>,
    /// Gas price, in wei
    #[serde(default)]
    pub gas_price: Option<String>,
}

/// Issues reported alongside a quote
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZeroExIssues {
    /// Set when the taker's allowance for the spender is insufficient
    #[serde(default)]
    pub allowance: Option<ZeroExAllowanceIssue>,
}

/// An insufficient allowance report
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZeroExAllowanceIssue {
    /// The allowance the quote service observed
    #[serde(default)]
    pub actual: Option<String>,
    /// The address that must be approved
    pub spender: String,
}

/// The permit2 envelope
#[derive(Debug, Deserialize)]
pub struct ZeroExPermit2 {
    /// The EIP-712 typed data to sign, kept verbatim
    #[serde(default)]
    pub eip712: Option<Value>,
}

/// Routing information, informational only
#[derive(Debug, Deserialize)]
pub struct ZeroExRoute {
    /// The liquidity fills making up the route
    #[serde(default)]
    pub fills: Vec<ZeroExFill>,
}

/// A single fill in a route
#[derive(Debug, Deserialize)]
pub struct ZeroExFill {
    /// The liquidity source name
    pub source: String,
}

fn parse_u256(field: &str, value: &str) -> Result<U256, QuoteError> {
    U256::from_str(value).map_err(|e| QuoteError::parse(format!("{field} '{value}': {e}")))
}

fn parse_address(field: &str, value: &str) -> Result<Address, QuoteError> {
    Address::from_str(value).map_err(|e| QuoteError::parse(format!("{field} '{value}': {e}")))
}

impl TryFrom<ZeroExQuote> for Quote {
    type Error = QuoteError;

    fn try_from(raw: ZeroExQuote) -> Result<Self, Self::Error> {
        let tx = raw.transaction;
        let gas = tx.gas.as_deref().ok_or_else(|| QuoteError::parse("missing transaction.gas"))?;
        let gas_price = tx
            .gas_price
            .as_deref()
            .ok_or_else(|| QuoteError::parse("missing transaction.gasPrice"))?;

        let transaction = QuoteTransaction {
            to: parse_address("transaction.to", &tx.to)?,
            data: Bytes::from_str(&tx.data)
                .map_err(|e| QuoteError::parse(format!("transaction.data: {e}")))?,
            value: match tx.value.as_deref() {
                Some(v) => parse_u256("transaction.value", v)?,
                None => U256::ZERO,
            },
            gas: u64::try_from(parse_u256("transaction.gas", gas)?)
                .map_err(|_| QuoteError::parse("transaction.gas exceeds u64"))?,
            gas_price: u128::try_from(parse_u256("transaction.gasPrice", gas_price)?)
                .map_err(|_| QuoteError::parse("transaction.gasPrice exceeds u128"))?,
        };

        let allowance_issue = match raw.issues.and_then(|issues| issues.allowance) {
            Some(issue) => Some(AllowanceIssue {
                spender: parse_address("issues.allowance.spender", &issue.spender)?,
                actual: issue
                    .actual
                    .as_deref()
                    .map(|a| parse_u256("issues.allowance.actual", a))
                    .transpose()?,
            }),
            None => None,
        };

        let sources = raw
            .route
            .map(|route| route.fills.into_iter().map(|fill| fill.source).collect())
            .unwrap_or_default();

        Ok(Quote {
            sell_amount: parse_u256("sellAmount", &raw.sell_amount)?,
            buy_amount: parse_u256("buyAmount", &raw.buy_amount)?,
            transaction,
            allowance_issue,
            permit2: raw.permit2.and_then(|p| p.eip712),
            sources,
        })
    }
}
