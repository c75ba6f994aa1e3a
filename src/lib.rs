//! Client core for a guided fiat-to-stablecoin transfer journey.
//!
//! The backend stays the single source of truth: commands go out through
//! the gateway client, and local state is reconciled from a periodic poll
//! plus a payload-less push feed. The lifecycle controller enforces the
//! transition table and gates the on-chain settlement step.

pub mod chain;
pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod instructions;
pub mod lifecycle;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod validation;

use std::sync::Arc;

use crate::chain::client::EvmRpcClient;
use crate::chain::settlement::SettlementAdapter;
use crate::config::Config;
use crate::gateway::client::ApiClient;
use crate::lifecycle::LifecycleController;
use crate::reconcile::Reconciler;
use crate::session::Session;
use crate::store::EntityStore;

pub use crate::error::{CoreError, CoreResult};

/// The wired core components for one session.
pub struct AppContext {
    pub api: Arc<ApiClient>,
    pub store: Arc<EntityStore>,
    pub controller: Arc<LifecycleController>,
    pub reconciler: Arc<Reconciler>,
}

impl AppContext {
    pub fn new(config: &Config, session: Session) -> Self {
        let api = Arc::new(ApiClient::new(config.api_base_url.clone(), session));
        let store = Arc::new(EntityStore::new());

        let connector = Arc::new(EvmRpcClient::new(config.chain_rpc_url.clone()));
        let settlement = SettlementAdapter::new(
            connector,
            config.token_contract.clone(),
            config.escrow_address.clone(),
        );

        let controller = Arc::new(LifecycleController::new(
            api.clone(),
            store.clone(),
            settlement,
        ));
        let reconciler = Arc::new(Reconciler::new(
            api.clone(),
            store.clone(),
            config.poll_interval(),
        ));

        Self {
            api,
            store,
            controller,
            reconciler,
        }
    }
}
