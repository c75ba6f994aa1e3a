use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::validation;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub events_base_url: Option<String>,
    pub poll_interval_secs: u64,
    pub chain_rpc_url: String,
    pub token_contract: String,
    pub escrow_address: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load .env file if present

        Ok(Config {
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            events_base_url: env::var("EVENTS_BASE_URL").ok(),
            poll_interval_secs: env::var("POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| {
                    crate::reconcile::DEFAULT_POLL_INTERVAL.as_secs().to_string()
                })
                .parse()?,
            chain_rpc_url: env::var("CHAIN_RPC_URL")
                .unwrap_or_else(|_| "https://rpc.sepolia.org".to_string()),
            token_contract: env::var("TOKEN_CONTRACT")
                .unwrap_or_else(|_| "0x6359b6B9D0E3C8836160B99aEe77a0aB1F71b34E".to_string()),
            escrow_address: env::var("ESCROW_ADDRESS")
                .unwrap_or_else(|_| "0x4c0FeD497BC2868E1010C8eC8bEfcfCd3013601b".to_string()),
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Base URL for the push feed; falls back to the API host.
    pub fn events_base(&self) -> &str {
        self.events_base_url.as_deref().unwrap_or(&self.api_base_url)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            anyhow::bail!("POLL_INTERVAL_SECS must be greater than 0");
        }

        url::Url::parse(&self.api_base_url).context("API_BASE_URL is not a valid URL")?;
        if let Some(events) = &self.events_base_url {
            url::Url::parse(events).context("EVENTS_BASE_URL is not a valid URL")?;
        }
        url::Url::parse(&self.chain_rpc_url).context("CHAIN_RPC_URL is not a valid URL")?;

        validation::validate_evm_address(&self.token_contract)
            .map_err(|e| anyhow::anyhow!("TOKEN_CONTRACT: {e}"))?;
        validation::validate_evm_address(&self.escrow_address)
            .map_err(|e| anyhow::anyhow!("ESCROW_ADDRESS: {e}"))?;

        Ok(())
    }
}
