use std::time::Duration;

use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    Channel, Currency, Direction, Transaction, TransactionDraft, TransactionStatus, User,
};
use crate::session::Session;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("gateway returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response from gateway: {0}")]
    InvalidResponse(String),
    #[error("gateway rejected the request: {0}")]
    Rejected(String),
    #[error("circuit breaker open: {0}")]
    CircuitBreakerOpen(String),
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    user: Option<User>,
}

#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    transactions: Vec<Transaction>,
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    direction: Direction,
    amount: &'a bigdecimal::BigDecimal,
    currency: Currency,
    funds_in: Channel,
    funds_out: Channel,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    ok: bool,
    #[serde(default)]
    transaction_id: Option<Uuid>,
    #[serde(default)]
    error: Option<String>,
}

/// Server acknowledgment of a submitted transfer.
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    pub transaction_id: Uuid,
}

#[derive(Debug, Serialize)]
struct StatusRequest {
    status: TransactionStatus,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    transaction: Transaction,
}

#[derive(Debug, Deserialize)]
struct AckResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct OnboardingRequest<'a> {
    telegram_user_id: Option<&'a str>,
    phone_number: &'a str,
}

#[derive(Debug, Deserialize)]
struct OnboardingResponse {
    #[serde(rename = "onboardingUrl")]
    onboarding_url: String,
}

#[derive(Debug, Serialize)]
struct WalletRequest<'a> {
    address: &'a str,
    telegram_user_id: Option<&'a str>,
}

/// HTTP client for the remittance gateway API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Session,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>,
}

impl ApiClient {
    /// Creates a new ApiClient for the given gateway base URL.
    pub fn new(base_url: String, session: Session) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(Duration::from_secs(60), Duration::from_secs(120));
        let policy = failure_policy::consecutive_failures(3, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        ApiClient {
            client,
            base_url,
            session,
            circuit_breaker,
        }
    }

    /// Returns the current state of the circuit breaker.
    pub fn circuit_state(&self) -> &'static str {
        if self.circuit_breaker.is_call_permitted() {
            "closed"
        } else {
            "open"
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let mut req = self
            .client
            .request(method, url)
            .header("Content-Type", "application/json");
        if let Some(auth) = self.session.authorization() {
            req = req.header("Authorization", auth);
        }
        req
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, GatewayError> {
        let fut = async move {
            let response = req.send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(GatewayError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            let parsed = response.json::<T>().await?;
            Ok(parsed)
        };

        match self.circuit_breaker.call(fut).await {
            Ok(value) => Ok(value),
            Err(FailsafeError::Rejected) => Err(GatewayError::CircuitBreakerOpen(
                "gateway circuit breaker is open".to_string(),
            )),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }

    /// Fetches the current user profile; `None` until first contact with
    /// the backend created one.
    pub async fn fetch_me(&self) -> Result<Option<User>, GatewayError> {
        let resp: MeResponse = self.call(self.request(Method::GET, "/api/me")).await?;
        Ok(resp.user)
    }

    /// Fetches the full transaction-list snapshot.
    pub async fn fetch_transactions(&self) -> Result<Vec<Transaction>, GatewayError> {
        let resp: TransactionsResponse = self
            .call(self.request(Method::GET, "/api/transactions"))
            .await?;
        Ok(resp.transactions)
    }

    /// Submits a new transfer request.
    pub async fn submit_transaction(
        &self,
        draft: &TransactionDraft,
    ) -> Result<SubmitReceipt, GatewayError> {
        let body = SubmitRequest {
            kind: if draft.escrow { "ESCROW" } else { "TRANSFER" },
            direction: draft.direction,
            amount: &draft.amount,
            currency: draft.currency,
            funds_in: draft.funds_in,
            funds_out: draft.funds_out,
        };
        let req = self
            .request(Method::POST, "/api/transaction/submit")
            .json(&body);
        let resp: SubmitResponse = self.call(req).await?;

        if !resp.ok {
            return Err(GatewayError::Rejected(
                resp.error.unwrap_or_else(|| "submission refused".to_string()),
            ));
        }
        resp.transaction_id
            .map(|transaction_id| SubmitReceipt { transaction_id })
            .ok_or_else(|| GatewayError::InvalidResponse("missing transaction_id".to_string()))
    }

    /// Requests a status transition; returns the canonical updated record.
    pub async fn update_status(
        &self,
        id: Uuid,
        status: TransactionStatus,
    ) -> Result<Transaction, GatewayError> {
        let req = self
            .request(Method::POST, &format!("/api/transaction/{id}/status"))
            .json(&StatusRequest { status });
        let resp: StatusResponse = self.call(req).await?;
        Ok(resp.transaction)
    }

    /// Notifies the gateway that funds were observed for a processing
    /// transfer.
    pub async fn notify_deposit(&self, id: Uuid) -> Result<(), GatewayError> {
        let req = self.request(Method::POST, &format!("/api/transaction/{id}/deposit"));
        let resp: AckResponse = self.call(req).await?;
        if resp.ok {
            Ok(())
        } else {
            Err(GatewayError::Rejected(resp.error.unwrap_or_else(|| {
                "deposit notification refused".to_string()
            })))
        }
    }

    /// Starts identity verification; returns the external onboarding URL.
    pub async fn request_onboarding(
        &self,
        telegram_user_id: Option<&str>,
        phone_number: &str,
    ) -> Result<String, GatewayError> {
        let req = self
            .request(Method::POST, "/api/onboarding")
            .json(&OnboardingRequest {
                telegram_user_id,
                phone_number,
            });
        let resp: OnboardingResponse = self.call(req).await?;
        Ok(resp.onboarding_url)
    }

    /// Registers a self-custody wallet address for the user.
    pub async fn register_wallet(
        &self,
        address: &str,
        telegram_user_id: Option<&str>,
    ) -> Result<(), GatewayError> {
        let req = self
            .request(Method::POST, "/api/wallet")
            .json(&WalletRequest {
                address,
                telegram_user_id,
            });
        let resp: AckResponse = self.call(req).await?;
        if resp.ok {
            Ok(())
        } else {
            Err(GatewayError::Rejected(resp.error.unwrap_or_else(|| {
                "wallet registration refused".to_string()
            })))
        }
    }
}
