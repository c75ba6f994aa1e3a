pub mod client;
pub mod settlement;

pub use client::{ChainConnector, Confirmation, ContractCall, EvmRpcClient, RpcError};
pub use settlement::{to_token_units, SettlementAdapter, SettlementOutcome, TOKEN_DECIMALS};
