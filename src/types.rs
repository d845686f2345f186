//! Core types shared across the swap pipeline

use std::fmt;

use alloy::primitives::{Address, TxHash, U256};
use bigdecimal::BigDecimal;
use serde::Deserialize;

use crate::chain::ReceiptSummary;

/// An ERC-20 token taking part in a swap
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Token {
    /// Display symbol, used in logs only
    pub symbol: String,
    /// The token contract
    pub address: Address,
    /// The token's decimal count
    pub decimals: u8,
}

/// Which way across the configured pair a swap goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwapDirection {
    /// Sell token A for token B
    #[default]
    AToB,
    /// Sell token B for token A
    BToA,
}

impl SwapDirection {
    /// Parse the numeric CLI selector (1 = A to B, 2 = B to A)
    pub fn from_selector(selector: u8) -> Option<Self> {
        match selector {
            1 => Some(SwapDirection::AToB),
            2 => Some(SwapDirection::BToA),
            _ => None,
        }
    }

    /// Order a token pair as (sell, buy)
    pub fn orient<'a>(&self, token_a: &'a Token, token_b: &'a Token) -> (&'a Token, &'a Token) {
        match self {
            SwapDirection::AToB => (token_a, token_b),
            SwapDirection::BToA => (token_b, token_a),
        }
    }
}

/// When to send a standalone approval for a reported allowance issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalPolicy {
    /// Approve whenever the quote reports an allowance issue
    #[default]
    Always,
    /// Skip the approval when a permit2 signature is being attached
    SkipWithPermit2,
}

impl ApprovalPolicy {
    /// Whether an approval should be attempted for this quote
    pub fn should_approve(&self, allowance_issue: bool, has_permit2_signature: bool) -> bool {
        match self {
            ApprovalPolicy::Always => allowance_issue,
            ApprovalPolicy::SkipWithPermit2 => allowance_issue && !has_permit2_signature,
        }
    }
}

/// The input to one swap attempt
#[derive(Debug, Clone)]
pub struct SwapRequest {
    /// The token being sold
    pub sell_token: Token,
    /// The token being bought
    pub buy_token: Token,
    /// The amount to sell, in whole units of the sell token
    pub sell_amount: BigDecimal,
}

/// The result of a confirmed swap
#[derive(Debug, Clone)]
pub struct SwapOutcome {
    /// The confirmed swap transaction
    pub tx_hash: TxHash,
    /// The approval sent ahead of the swap, if any
    pub approval_tx_hash: Option<TxHash>,
    /// The swap receipt
    pub receipt: ReceiptSummary,
    /// The quoted sell amount, in base units
    pub sell_amount: U256,
    /// The quoted buy amount, in base units
    pub buy_amount: U256,
}

/// The steps of a swap attempt, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapStage {
    Quoting,
    Permit2Signing,
    AllowanceCheck,
    Approving,
    Submitting,
    Confirming,
    Done,
}

impl fmt::Display for SwapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SwapStage::Quoting => "quoting",
            SwapStage::Permit2Signing => "permit2-signing",
            SwapStage::AllowanceCheck => "allowance-check",
            SwapStage::Approving => "approving",
            SwapStage::Submitting => "submitting",
            SwapStage::Confirming => "confirming",
            SwapStage::Done => "done",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;

    #[test]
    fn direction_selector() {
        assert_eq!(SwapDirection::from_selector(1), Some(SwapDirection::AToB));
        assert_eq!(SwapDirection::from_selector(2), Some(SwapDirection::BToA));
        assert_eq!(SwapDirection::from_selector(0), None);
        assert_eq!(SwapDirection::from_selector(3), None);
    }

    #[test]
    fn direction_orients_pair() {
        let a = Token {
            symbol: "BRLA".to_string(),
            address: address!("0xe6a537a407488807f0bbeb0038b79004f19dddfb"),
            decimals: 18,
        };
        let b = Token {
            symbol: "USDC".to_string(),
            address: address!("0x3c499c542cef5e3811e1192ce70d8cc03d5c3359"),
            decimals: 6,
        };

        let (sell, buy) = SwapDirection::AToB.orient(&a, &b);
        assert_eq!((sell.symbol.as_str(), buy.symbol.as_str()), ("BRLA", "USDC"));
        let (sell, buy) = SwapDirection::BToA.orient(&a, &b);
        assert_eq!((sell.symbol.as_str(), buy.symbol.as_str()), ("USDC", "BRLA"));
    }

    #[test]
    fn approval_policy() {
        assert!(ApprovalPolicy::Always.should_approve(true, true));
        assert!(ApprovalPolicy::Always.should_approve(true, false));
        assert!(!ApprovalPolicy::Always.should_approve(false, false));

        assert!(!ApprovalPolicy::SkipWithPermit2.should_approve(true, true));
        assert!(ApprovalPolicy::SkipWithPermit2.should_approve(true, false));
        assert!(!ApprovalPolicy::SkipWithPermit2.should_approve(false, true));
    }
}
