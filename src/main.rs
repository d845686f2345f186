use std::{
    io::{self, BufRead, Write},
    sync::Arc,
};

use anyhow::Result;
use clap::Parser;
use swapexec::{
    amount::parse_amount,
    chain::ChainSession,
    config::Config,
    engine::SwapOrchestrator,
    error::SwapError,
    quoters::zeroex::ZeroExClient,
    types::{SwapDirection, SwapRequest},
};
use tracing::Level;
use tracing_subscriber::{filter, prelude::*};

/// Swap between the two configured tokens through the 0x permit2 API
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Amount of the sell token to swap; prompted for when omitted
    amount: Option<String>,
    /// 1 = sell token A for token B, 2 = sell token B for token A
    #[arg(default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
    direction: u8,
    /// Path to the TOML configuration file
    #[arg(long, env = "SWAP_CONFIG", default_value = "config.toml")]
    config: String,
    /// Log at debug level
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Set up tracing
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = filter::Targets::new().with_target("swapexec", level);
    tracing_subscriber::registry().with(tracing_subscriber::fmt::layer()).with(filter).init();

    let config = Config::load(&cli.config)?;
    let direction = SwapDirection::from_selector(cli.direction)
        .ok_or_else(|| anyhow::anyhow!("direction must be 1 or 2"))?;
    let (sell_token, buy_token) = direction.orient(&config.token_a, &config.token_b);

    let amount = match cli.amount {
        Some(amount) => amount,
        None => prompt(&format!("Enter amount of {} to swap: ", sell_token.symbol))?,
    };
    let request = SwapRequest {
        sell_token: sell_token.clone(),
        buy_token: buy_token.clone(),
        sell_amount: parse_amount(&amount)?,
    };

    let session =
        ChainSession::connect(&config.private_key, &config.rpc_url, config.chain_id).await?;
    let quoter = ZeroExClient::new(
        &config.quote_api.base_url,
        config.quote_api.api_key(),
        config.quote_api.api_version.clone(),
        config.chain_id,
    );
    let orchestrator =
        SwapOrchestrator::new(session, Arc::new(quoter), config.execution.settings());

    match orchestrator.execute(&request).await {
        Ok(outcome) => {
            let tx_hash = format!("{:#x}", outcome.tx_hash);
            println!("Swap completed successfully!");
            println!("Transaction Hash: {tx_hash}");
            println!("Check the transaction on the explorer:");
            println!("{}", config.explorer_tx_url(&tx_hash));
            Ok(())
        },
        Err(e) => {
            if let Some(tx_hash) = e.tx_hash() {
                let tx_hash = format!("{tx_hash:#x}");
                if matches!(e, SwapError::TimedOut { .. }) {
                    println!("Transaction is taking longer than expected to be mined.");
                }
                println!("You can check the status manually: {}", config.explorer_tx_url(&tx_hash));
            }
            Err(e.into())
        },
    }
}

/// Read a line from stdin after printing `message`
fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
