use thiserror::Error;
use uuid::Uuid;

use crate::domain::TransactionStatus;
use crate::gateway::client::GatewayError;
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("gateway call failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error("invalid transition from {current} to {requested}")]
    InvalidTransition {
        current: TransactionStatus,
        requested: TransactionStatus,
    },

    #[error("a command is already in flight for transaction {0}")]
    CommandInFlight(Uuid),

    #[error("transaction {0} not found")]
    NotFound(Uuid),

    #[error("settlement failed: {0}")]
    Settlement(String),

    #[error("no wallet connected")]
    NeedsConnection,

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Recoverable by re-issuing the same call.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Gateway(_) | CoreError::Settlement(_))
    }

    /// Recoverable only through a user action, not a retry.
    pub fn needs_user_action(&self) -> bool {
        matches!(self, CoreError::NeedsConnection)
    }
}
