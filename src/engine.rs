use std::sync::Arc;

use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::{
    amount::{from_base_units, to_base_units},
    chain::ChainSession,
    error::SwapError,
    executors::{AllowanceManager, ConfirmationPoller, TransactionSubmitter},
    quoters::{Quote, QuoteParams, QuoteProvider},
    signing::{Permit2Signature, sign_permit2},
    types::{ApprovalPolicy, SwapOutcome, SwapRequest, SwapStage},
};

/// Tunables for a swap attempt
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionSettings {
    /// Receipt polling for both the approval and the swap
    pub poller: ConfirmationPoller,
    /// When a reported allowance issue triggers an approval
    pub approval_policy: ApprovalPolicy,
}

/// Runs the swap protocol end to end: quote, sign, approve, submit, confirm
///
/// Holds no state between invocations; each call to
/// [`execute`](SwapOrchestrator::execute) is one independent attempt.
pub struct SwapOrchestrator {
    session: ChainSession,
    quoter: Arc<dyn QuoteProvider>,
    settings: ExecutionSettings,
    allowances: AllowanceManager,
    submitter: TransactionSubmitter,
}

impl SwapOrchestrator {
    pub fn new(
        session: ChainSession,
        quoter: Arc<dyn QuoteProvider>,
        settings: ExecutionSettings,
    ) -> Self {
        let allowances = AllowanceManager::new(session.clone(), settings.poller);
        let submitter = TransactionSubmitter::new(session.clone());
        Self { session, quoter, settings, allowances, submitter }
    }

    /// Execute one swap
    pub async fn execute(&self, request: &SwapRequest) -> Result<SwapOutcome, SwapError> {
        let span = info_span!(
            "swap",
            swap_id = %Uuid::new_v4(),
            sell = %request.sell_token.symbol,
            buy = %request.buy_token.symbol,
        );

        async {
            let result = self.run(request).await;
            if let Err(e) = &result {
                warn!("swap failed: {e}");
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, request: &SwapRequest) -> Result<SwapOutcome, SwapError> {
        let SwapRequest { sell_token, buy_token, sell_amount } = request;
        info!("swapping {sell_amount} {} to {}", sell_token.symbol, buy_token.symbol);
        info!("using wallet address: {}", self.session.address());

        enter(SwapStage::Quoting);
        let params = QuoteParams {
            sell_token: sell_token.address,
            buy_token: buy_token.address,
            sell_amount: to_base_units(sell_amount, sell_token.decimals)?,
            taker: self.session.address(),
        };
        let quote = self.quoter.get_quote(&params).await.map_err(SwapError::quote_unavailable)?;
        self.log_quote(request, &quote);

        let signature = self.sign_permit(&quote)?;

        enter(SwapStage::AllowanceCheck);
        let approve = self
            .settings
            .approval_policy
            .should_approve(quote.allowance_issue.is_some(), signature.is_some());
        let approval_tx_hash = match (&quote.allowance_issue, approve) {
            (Some(issue), true) => {
                enter(SwapStage::Approving);
                self.allowances
                    .ensure_allowance(sell_token.address, issue.spender, quote.sell_amount)
                    .await?
            },
            (Some(issue), false) => {
                info!("skipping approval for {} in favour of permit2", issue.spender);
                None
            },
            (None, _) => None,
        };

        enter(SwapStage::Submitting);
        let tx_hash = self.submitter.submit(&quote.transaction, signature.as_ref()).await?;

        enter(SwapStage::Confirming);
        let receipt =
            self.settings.poller.wait_for_receipt(self.session.client(), tx_hash).await?;

        enter(SwapStage::Done);
        info!("swap successful: {tx_hash:#x}");
        Ok(SwapOutcome {
            tx_hash,
            approval_tx_hash,
            receipt,
            sell_amount: quote.sell_amount,
            buy_amount: quote.buy_amount,
        })
    }

    /// Sign the quote's permit2 payload, if it carries one
    fn sign_permit(&self, quote: &Quote) -> Result<Option<Permit2Signature>, SwapError> {
        let Some(typed_data) = &quote.permit2 else {
            return Ok(None);
        };

        enter(SwapStage::Permit2Signing);
        info!("quote contains permit2 data, generating signature");
        let signature = sign_permit2(typed_data, self.session.signer())?;
        info!("permit2 signature generated: {signature}");
        Ok(Some(signature))
    }

    fn log_quote(&self, request: &SwapRequest, quote: &Quote) {
        if !quote.sources.is_empty() {
            info!("quote received from sources: {}", quote.sources.join(", "));
        }

        let sell = from_base_units(quote.sell_amount, request.sell_token.decimals);
        let buy = from_base_units(quote.buy_amount, request.buy_token.decimals);
        info!(
            "expected output: {buy} {} for {sell} {}",
            request.buy_token.symbol, request.sell_token.symbol
        );
    }
}

fn enter(stage: SwapStage) {
    info!(%stage, "entering stage");
}
