//! On-chain steps of a swap: approval, submission and confirmation

pub mod allowance;
pub mod confirmation;
pub mod submitter;

pub use allowance::AllowanceManager;
pub use confirmation::{ConfirmationPoller, ConfirmationState};
pub use submitter::TransactionSubmitter;
