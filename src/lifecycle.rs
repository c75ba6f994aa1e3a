//! Transaction lifecycle controller: validates transitions locally, issues
//! them remotely, and keeps the store canonical.
//!
//! One command per transaction id may be in flight at a time; the transport
//! does not enforce this, so the controller does.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::chain::settlement::{SettlementAdapter, SettlementOutcome};
use crate::domain::{Channel, Transaction, TransactionDraft, TransactionStatus};
use crate::error::{CoreError, CoreResult};
use crate::gateway::client::ApiClient;
use crate::store::EntityStore;
use crate::validation::{self, ValidationError};

pub struct LifecycleController {
    api: Arc<ApiClient>,
    store: Arc<EntityStore>,
    settlement: SettlementAdapter,
    in_flight: Mutex<HashSet<Uuid>>,
}

impl LifecycleController {
    pub fn new(api: Arc<ApiClient>, store: Arc<EntityStore>, settlement: SettlementAdapter) -> Self {
        Self {
            api,
            store,
            settlement,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Validates and submits a new transfer; returns the server-assigned
    /// id.
    pub async fn submit(&self, draft: &TransactionDraft) -> CoreResult<Uuid> {
        validation::validate_draft(draft)?;
        let receipt = self.api.submit_transaction(draft).await?;
        tracing::info!(transaction_id = %receipt.transaction_id, "transfer submitted");
        Ok(receipt.transaction_id)
    }

    /// Requests `target` for the transaction. Invalid transitions are
    /// rejected before any network call and mutate nothing; on success the
    /// canonical server record replaces the local one.
    pub async fn request_transition(
        &self,
        id: Uuid,
        target: TransactionStatus,
    ) -> CoreResult<Transaction> {
        let _guard = self.begin_command(id)?;
        self.transition_unguarded(id, target).await
    }

    pub async fn confirm(&self, id: Uuid) -> CoreResult<Transaction> {
        self.request_transition(id, TransactionStatus::Processing).await
    }

    pub async fn cancel(&self, id: Uuid) -> CoreResult<Transaction> {
        self.request_transition(id, TransactionStatus::Cancelled).await
    }

    /// Reports an observed deposit for a processing transfer. The local
    /// record is advanced optimistically so the UI reacts at once; the next
    /// authoritative fetch settles the truth.
    pub async fn notify_deposit(&self, id: Uuid) -> CoreResult<Transaction> {
        let _guard = self.begin_command(id)?;
        let current = self.store.transaction(id).ok_or(CoreError::NotFound(id))?;
        if current.status != TransactionStatus::Processing {
            return Err(CoreError::InvalidTransition {
                current: current.status,
                requested: TransactionStatus::Deposited,
            });
        }

        self.api.notify_deposit(id).await?;

        let mut optimistic = current;
        optimistic.status = TransactionStatus::Deposited;
        self.store.apply_optimistic(optimistic.clone());
        Ok(optimistic)
    }

    /// Runs the on-chain settlement gating DEPOSITED → TRANSFERRED. Only a
    /// confirmed call advances the transaction; every other outcome leaves
    /// it deposited and retryable.
    pub async fn settle(&self, id: Uuid) -> CoreResult<SettlementOutcome> {
        let _guard = self.begin_command(id)?;
        let current = self.store.transaction(id).ok_or(CoreError::NotFound(id))?;
        if current.status != TransactionStatus::Deposited {
            return Err(CoreError::InvalidTransition {
                current: current.status,
                requested: TransactionStatus::Transferred,
            });
        }

        let wallet = self.store.user().and_then(|u| u.wallet_address.clone());
        let outcome = self
            .settlement
            .transfer(wallet.as_deref(), &current.amount)
            .await?;

        if let SettlementOutcome::Confirmed { .. } = outcome {
            self.transition_unguarded(id, TransactionStatus::Transferred)
                .await?;
        }
        Ok(outcome)
    }

    /// Mirrored mint leg for an on-chain deposit: credits the settlement
    /// asset to the user's wallet, then reports the deposit as observed.
    pub async fn mint_deposit(&self, id: Uuid) -> CoreResult<SettlementOutcome> {
        let _guard = self.begin_command(id)?;
        let current = self.store.transaction(id).ok_or(CoreError::NotFound(id))?;
        if current.status != TransactionStatus::Processing {
            return Err(CoreError::InvalidTransition {
                current: current.status,
                requested: TransactionStatus::Deposited,
            });
        }
        if current.funds_in != Some(Channel::Crypto) {
            return Err(CoreError::Validation(ValidationError::new(
                "funds_in",
                "on-chain deposit requires the CRYPTO channel",
            )));
        }

        let wallet = self.store.user().and_then(|u| u.wallet_address.clone());
        let outcome = self
            .settlement
            .mint(wallet.as_deref(), &current.amount)
            .await?;

        if let SettlementOutcome::Confirmed { .. } = outcome {
            self.api.notify_deposit(id).await?;
            let mut optimistic = current;
            optimistic.status = TransactionStatus::Deposited;
            self.store.apply_optimistic(optimistic);
        }
        Ok(outcome)
    }

    fn begin_command(&self, id: Uuid) -> CoreResult<CommandGuard<'_>> {
        let mut in_flight = self.in_flight.lock().expect("in-flight set poisoned");
        if !in_flight.insert(id) {
            return Err(CoreError::CommandInFlight(id));
        }
        Ok(CommandGuard {
            set: &self.in_flight,
            id,
        })
    }

    async fn transition_unguarded(
        &self,
        id: Uuid,
        target: TransactionStatus,
    ) -> CoreResult<Transaction> {
        let current = self.store.transaction(id).ok_or(CoreError::NotFound(id))?;
        if !current.status.can_transition_to(target) {
            return Err(CoreError::InvalidTransition {
                current: current.status,
                requested: target,
            });
        }

        let canonical = self.api.update_status(id, target).await?;
        self.store.apply_canonical(canonical.clone());
        tracing::info!(transaction_id = %id, status = %canonical.status, "transition acknowledged");
        Ok(canonical)
    }
}

/// Releases the per-transaction command slot on drop.
struct CommandGuard<'a> {
    set: &'a Mutex<HashSet<Uuid>>,
    id: Uuid,
}

impl Drop for CommandGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut set) = self.set.lock() {
            set.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::client::EvmRpcClient;
    use crate::session::Session;

    fn controller() -> LifecycleController {
        let api = Arc::new(ApiClient::new(
            "http://localhost:9".to_string(),
            Session::default(),
        ));
        let store = Arc::new(EntityStore::new());
        let connector = Arc::new(EvmRpcClient::new("http://localhost:9".to_string()));
        let settlement = SettlementAdapter::new(
            connector,
            "0x6359b6B9D0E3C8836160B99aEe77a0aB1F71b34E".to_string(),
            "0x4c0FeD497BC2868E1010C8eC8bEfcfCd3013601b".to_string(),
        );
        LifecycleController::new(api, store, settlement)
    }

    #[test]
    fn second_command_for_same_id_is_rejected() {
        let controller = controller();
        let id = Uuid::new_v4();

        let guard = controller.begin_command(id).unwrap();
        assert!(matches!(
            controller.begin_command(id),
            Err(CoreError::CommandInFlight(_))
        ));

        // a different transaction is not blocked
        let other = controller.begin_command(Uuid::new_v4());
        assert!(other.is_ok());

        drop(guard);
        assert!(controller.begin_command(id).is_ok());
    }
}
