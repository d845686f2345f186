use std::{fs, time::Duration};

use anyhow::Result;
use serde::Deserialize;

use crate::{
    engine::ExecutionSettings,
    executors::confirmation::{ConfirmationPoller, DEFAULT_MAX_POLL_ATTEMPTS},
    types::{ApprovalPolicy, Token},
};

/// Largest decimal count accepted for a token
const MAX_TOKEN_DECIMALS: u8 = 36;

#[derive(Deserialize, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub chain_id: u64,
    pub private_key: String,
    /// Block explorer base URL, e.g. `https://polygonscan.com`
    pub explorer_url: String,
    pub quote_api: QuoteApiConfig,
    pub token_a: Token,
    pub token_b: Token,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QuoteApiConfig {
    pub base_url: String,
    /// Requests are sent without API headers when this is empty
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ExecutionConfig {
    pub poll_interval_secs: u64,
    pub max_poll_attempts: u32,
    pub approval_policy: ApprovalPolicy,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            approval_policy: ApprovalPolicy::default(),
        }
    }
}

impl ExecutionConfig {
    pub fn settings(&self) -> ExecutionSettings {
        ExecutionSettings {
            poller: ConfirmationPoller::new(
                Duration::from_secs(self.poll_interval_secs),
                self.max_poll_attempts,
            ),
            approval_policy: self.approval_policy,
        }
    }
}

fn default_api_version() -> String {
    "v2".to_string()
}

impl QuoteApiConfig {
    /// The API key, treating an empty value as unset
    pub fn api_key(&self) -> Option<String> {
        self.api_key.clone().filter(|key| !key.trim().is_empty())
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;

        // Simple env var substitution: replace ${VAR} with env value
        let content = substitute_vars(&content, |name| std::env::var(name).ok())?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.execution.max_poll_attempts == 0 {
            anyhow::bail!("max_poll_attempts must be > 0");
        }

        for token in [&self.token_a, &self.token_b] {
            if token.decimals > MAX_TOKEN_DECIMALS {
                anyhow::bail!(
                    "token '{}' has {} decimals, at most {MAX_TOKEN_DECIMALS} are supported",
                    token.symbol,
                    token.decimals
                );
            }
        }

        if self.token_a.address == self.token_b.address {
            anyhow::bail!("token_a and token_b must be different tokens");
        }

        if self.quote_api.api_version.trim().is_empty() {
            anyhow::bail!("quote_api.api_version must not be empty");
        }

        Ok(())
    }

    /// Explorer link for a transaction
    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{tx_hash}", self.explorer_url.trim_end_matches('/'))
    }
}

/// Replace each `${VAR}` in `content` with the value `lookup` returns for it
fn substitute_vars(content: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
    let mut result = content.to_string();
    let mut from = 0;
    while let Some(start) = result[from..].find("${").map(|i| i + from) {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = lookup(var_name).ok_or_else(|| {
            anyhow::anyhow!("Environment variable {} not found (check your .env file)", var_name)
        })?;
        result.replace_range(start..start + end + 1, &value);
        from = start + value.len();
    }
    Ok(result)
}
