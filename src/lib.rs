/// This module contains the amount codec between decimal and base units.
pub mod amount;
/// This module contains the [ChainSession](chain::ChainSession) and the chain
/// client abstraction.
pub mod chain;
/// This module contains configuration loading.
pub mod config;
/// This module contains the [SwapOrchestrator](engine::SwapOrchestrator),
/// which sequences a swap attempt from quote to confirmation.
pub mod engine;
/// This module contains the swap error taxonomy.
pub mod error;
/// This module contains the allowance, submission and confirmation steps.
pub mod executors;
/// This module contains [quote provider](quoters::QuoteProvider)
/// implementations.
pub mod quoters;
/// This module contains permit2 signing.
pub mod signing;
/// This module contains the core type definitions.
pub mod types;
