//! Full journey of one transfer: submit, confirm, observed deposit,
//! on-chain settlement, completion, withdrawal instructions.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use remit_core::chain::client::EvmRpcClient;
use remit_core::chain::settlement::{SettlementAdapter, SettlementOutcome};
use remit_core::domain::{Channel, Currency, Direction, TransactionDraft, TransactionStatus};
use remit_core::gateway::client::ApiClient;
use remit_core::instructions;
use remit_core::lifecycle::LifecycleController;
use remit_core::reconcile::Reconciler;
use remit_core::session::Session;
use remit_core::store::EntityStore;

const WALLET: &str = "0x4c0FeD497BC2868E1010C8eC8bEfcfCd3013601b";
const TOKEN: &str = "0x6359b6B9D0E3C8836160B99aEe77a0aB1F71b34E";

fn tx_json(id: Uuid, status: &str) -> String {
    format!(
        r#"{{
            "id": "{id}",
            "reference": "TX-0042",
            "amount": "125.50",
            "currency": "euro",
            "direction": "FIAT_TO_CHAIN",
            "status": "{status}",
            "funds_in": "BANK_WIRE",
            "funds_out": "MOBILE_MONEY",
            "phone": "+243 812 345 678",
            "created": "2024-05-01T10:00:00Z"
        }}"#
    )
}

fn user_json() -> String {
    format!(
        r#"{{
            "user": {{
                "id": "8f14e45f-ceea-467f-a8d5-91ee24eb21ec",
                "telegram_user_id": "42",
                "kyc_status": "APPROVED",
                "user_tw_eoa": "{WALLET}",
                "phone": "+243 812 345 678"
            }}
        }}"#
    )
}

async fn transactions_mock(server: &mut mockito::Server, id: Uuid, status: &str) -> mockito::Mock {
    server
        .mock("GET", "/api/transactions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"transactions": [{}]}}"#, tx_json(id, status)))
        .create_async()
        .await
}

#[tokio::test]
async fn transfer_walks_the_full_lifecycle() {
    let id = Uuid::new_v4();
    let mut gateway = mockito::Server::new_async().await;
    let mut chain = mockito::Server::new_async().await;

    let _me = gateway
        .mock("GET", "/api/me")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(user_json())
        .create_async()
        .await;

    let session = Session::new(Some("query_id=scenario".to_string()));
    let api = Arc::new(ApiClient::new(gateway.url(), session));
    let store = Arc::new(EntityStore::new());
    let connector = Arc::new(EvmRpcClient::new(chain.url()));
    let settlement = SettlementAdapter::new(connector, TOKEN.to_string(), WALLET.to_string())
        .with_confirmation_budget(3, Duration::from_millis(10));
    let controller = LifecycleController::new(api.clone(), store.clone(), settlement);
    let reconciler = Reconciler::new(api, store.clone(), Duration::from_secs(15));

    // submit: the draft passes channel legality and the server assigns an id
    let submit_mock = gateway
        .mock("POST", "/api/transaction/submit")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"ok": true, "transaction_id": "{id}"}}"#))
        .expect(1)
        .create_async()
        .await;
    let draft = TransactionDraft {
        direction: Direction::FiatToChain,
        amount: "125.50".parse().unwrap(),
        currency: Currency::Euro,
        funds_in: Channel::BankWire,
        funds_out: Channel::MobileMoney,
        escrow: false,
    };
    let submitted_id = controller.submit(&draft).await.unwrap();
    assert_eq!(submitted_id, id);
    submit_mock.assert_async().await;

    // the next fetch shows it CREATED
    let list = transactions_mock(&mut gateway, id, "CREATED").await;
    reconciler.refresh().await.unwrap();
    assert_eq!(
        store.transaction(id).unwrap().status,
        TransactionStatus::Created
    );
    list.remove_async().await;

    // confirm: CREATED -> PROCESSING, canonical record replaces local state
    let confirm = gateway
        .mock("POST", format!("/api/transaction/{id}/status").as_str())
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "status": "PROCESSING"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"transaction": {}}}"#, tx_json(id, "PROCESSING")))
        .expect(1)
        .create_async()
        .await;
    let tx = controller.confirm(id).await.unwrap();
    assert_eq!(tx.status, TransactionStatus::Processing);
    confirm.remove_async().await;

    // deposit instructions are derivable while the transfer waits for funds
    let deposit_text = instructions::deposit_instructions(tx.funds_in);
    assert!(deposit_text.contains("IBAN"));

    // observed deposit: acknowledged, local copy optimistically DEPOSITED
    let deposit = gateway
        .mock("POST", format!("/api/transaction/{id}/deposit").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok": true}"#)
        .expect(1)
        .create_async()
        .await;
    let tx = controller.notify_deposit(id).await.unwrap();
    assert_eq!(tx.status, TransactionStatus::Deposited);
    deposit.assert_async().await;

    // the next poll confirms the deposit authoritatively
    let list = transactions_mock(&mut gateway, id, "DEPOSITED").await;
    reconciler.refresh().await.unwrap();
    assert_eq!(
        store.transaction(id).unwrap().status,
        TransactionStatus::Deposited
    );
    list.remove_async().await;

    // settlement: the chain call confirms and gates DEPOSITED -> TRANSFERRED
    let _submit_call = chain
        .mock("POST", "/")
        .match_body(mockito::Matcher::Regex("eth_sendTransaction".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0xfeedface"}"#)
        .create_async()
        .await;
    let _receipt_call = chain
        .mock("POST", "/")
        .match_body(mockito::Matcher::Regex(
            "eth_getTransactionReceipt".to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"jsonrpc":"2.0","id":2,"result":{"status":"0x1"}}"#)
        .create_async()
        .await;
    let transferred = gateway
        .mock("POST", format!("/api/transaction/{id}/status").as_str())
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "status": "TRANSFERRED"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(
            r#"{{"transaction": {}}}"#,
            tx_json(id, "TRANSFERRED")
        ))
        .expect(1)
        .create_async()
        .await;

    let outcome = controller.settle(id).await.unwrap();
    assert!(matches!(outcome, SettlementOutcome::Confirmed { .. }));
    assert_eq!(
        store.transaction(id).unwrap().status,
        TransactionStatus::Transferred
    );
    transferred.remove_async().await;

    // the off-chain leg completes on the backend; the poll picks it up
    let list = transactions_mock(&mut gateway, id, "COMPLETED").await;
    reconciler.refresh().await.unwrap();
    let done = store.transaction(id).unwrap();
    assert_eq!(done.status, TransactionStatus::Completed);
    assert!(done.status.is_terminal());
    list.remove_async().await;

    // withdrawal instructions derive from the receive channel and the
    // user's own coordinates
    let withdrawal = instructions::withdrawal_instructions(
        done.funds_out,
        done.iban.as_deref(),
        done.phone.as_deref(),
    );
    assert!(withdrawal.contains("Mobile Money"));
    assert!(withdrawal.contains("+243 812 345 678"));
}
