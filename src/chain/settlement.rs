//! Settlement-confirmation adapter: scales domain amounts into token
//! units, submits the transfer or mint call, and reports exactly one
//! outcome back to the lifecycle controller.

use std::sync::Arc;
use std::time::Duration;

use bigdecimal::BigDecimal;

use crate::chain::client::{ChainConnector, Confirmation, ContractCall};
use crate::error::{CoreError, CoreResult};

/// Decimal places of the settlement asset's smallest unit.
pub const TOKEN_DECIMALS: u32 = 6;

// transfer(address,uint256) / mintTo(address,uint256)
const TRANSFER_SELECTOR: &str = "a9059cbb";
const MINT_TO_SELECTOR: &str = "449a52f8";

const CONFIRMATION_ATTEMPTS: u32 = 12;
const CONFIRMATION_DELAY: Duration = Duration::from_secs(5);

/// Converts a domain amount into integer token units, truncating anything
/// below the smallest unit.
pub fn to_token_units(amount: &BigDecimal) -> Option<u128> {
    if amount < &BigDecimal::from(0) {
        return None;
    }
    // with_scale(0) drops the remaining fractional digits outright
    let scaled = (amount * BigDecimal::from(10u64.pow(TOKEN_DECIMALS))).with_scale(0);
    scaled.to_string().parse::<u128>().ok()
}

/// What became of a settlement call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// Accepted by the network, confirmation still pending.
    Submitted { tx_hash: String },
    Confirmed { tx_hash: String },
    /// The call reverted; the transaction stays where it was and the same
    /// operation may be retried.
    Failed { reason: String },
}

pub struct SettlementAdapter {
    connector: Arc<dyn ChainConnector>,
    token_contract: String,
    escrow_address: String,
    confirmation_attempts: u32,
    confirmation_delay: Duration,
}

impl SettlementAdapter {
    pub fn new(
        connector: Arc<dyn ChainConnector>,
        token_contract: String,
        escrow_address: String,
    ) -> Self {
        Self {
            connector,
            token_contract,
            escrow_address,
            confirmation_attempts: CONFIRMATION_ATTEMPTS,
            confirmation_delay: CONFIRMATION_DELAY,
        }
    }

    /// Shrinks the confirmation polling budget; used by tests and fast
    /// local chains.
    pub fn with_confirmation_budget(mut self, attempts: u32, delay: Duration) -> Self {
        self.confirmation_attempts = attempts;
        self.confirmation_delay = delay;
        self
    }

    /// Moves `amount` of the settlement asset from the connected wallet to
    /// the escrow address.
    pub async fn transfer(
        &self,
        wallet: Option<&str>,
        amount: &BigDecimal,
    ) -> CoreResult<SettlementOutcome> {
        let from = wallet.ok_or(CoreError::NeedsConnection)?;
        let units = to_token_units(amount).ok_or_else(|| {
            CoreError::Settlement(format!("amount {amount} cannot be scaled to token units"))
        })?;
        let data = encode_call(TRANSFER_SELECTOR, &self.escrow_address, units)?;
        self.execute(from, data).await
    }

    /// Credits `amount` of the settlement asset to the connected wallet.
    pub async fn mint(
        &self,
        wallet: Option<&str>,
        amount: &BigDecimal,
    ) -> CoreResult<SettlementOutcome> {
        let to = wallet.ok_or(CoreError::NeedsConnection)?;
        let units = to_token_units(amount).ok_or_else(|| {
            CoreError::Settlement(format!("amount {amount} cannot be scaled to token units"))
        })?;
        let data = encode_call(MINT_TO_SELECTOR, to, units)?;
        self.execute(to, data).await
    }

    async fn execute(&self, from: &str, data: String) -> CoreResult<SettlementOutcome> {
        let call = ContractCall {
            from: from.to_string(),
            to: self.token_contract.clone(),
            data,
        };
        let tx_hash = self
            .connector
            .submit(&call)
            .await
            .map_err(|e| CoreError::Settlement(e.to_string()))?;
        tracing::info!(%tx_hash, "settlement call submitted");

        for _ in 0..self.confirmation_attempts {
            tokio::time::sleep(self.confirmation_delay).await;
            match self.connector.confirmation(&tx_hash).await {
                Ok(Confirmation::Confirmed) => {
                    tracing::info!(%tx_hash, "settlement confirmed");
                    return Ok(SettlementOutcome::Confirmed { tx_hash });
                }
                Ok(Confirmation::Reverted) => {
                    tracing::warn!(%tx_hash, "settlement reverted");
                    return Ok(SettlementOutcome::Failed {
                        reason: format!("call {tx_hash} reverted"),
                    });
                }
                Ok(Confirmation::Pending) => {}
                Err(e) => tracing::warn!(%tx_hash, "receipt lookup failed: {e}"),
            }
        }

        // still unconfirmed: no transition yet, a later check can pick it up
        Ok(SettlementOutcome::Submitted { tx_hash })
    }
}

fn encode_call(selector: &str, address: &str, units: u128) -> CoreResult<String> {
    let addr = address.strip_prefix("0x").unwrap_or(address);
    if addr.len() != 40 || hex::decode(addr).is_err() {
        return Err(CoreError::Settlement(format!("invalid address: {address}")));
    }
    Ok(format!(
        "0x{}{:0>64}{:064x}",
        selector,
        addr.to_lowercase(),
        units
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn scaling_truncates_below_smallest_unit() {
        assert_eq!(to_token_units(&dec("12.3456789")), Some(12_345_678));
        assert_eq!(to_token_units(&dec("12.0000009")), Some(12_000_000));
        assert_eq!(to_token_units(&dec("1")), Some(1_000_000));
        assert_eq!(to_token_units(&dec("0.0000019")), Some(1));
        assert_eq!(to_token_units(&dec("0")), Some(0));
        assert_eq!(to_token_units(&dec("-1")), None);
    }

    #[test]
    fn encodes_selector_address_and_amount() {
        let data = encode_call(
            TRANSFER_SELECTOR,
            "0x4c0FeD497BC2868E1010C8eC8bEfcfCd3013601b",
            12_345_678,
        )
        .unwrap();

        // 0x + 4-byte selector + two 32-byte words
        assert_eq!(data.len(), 2 + 8 + 64 + 64);
        assert!(data.starts_with("0xa9059cbb"));
        assert!(data.contains("4c0fed497bc2868e1010c8ec8befcfcd3013601b"));
        assert!(data.ends_with(&format!("{:064x}", 12_345_678u128)));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(encode_call(TRANSFER_SELECTOR, "0x123", 1).is_err());
        assert!(encode_call(TRANSFER_SELECTOR, "not-hex", 1).is_err());
    }
}
