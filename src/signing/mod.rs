//! Off-chain signatures attached to swap transactions

pub mod permit2;

pub use permit2::{Permit2Signature, sign_permit2};
