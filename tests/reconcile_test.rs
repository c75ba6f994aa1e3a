use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use remit_core::domain::KycStatus;
use remit_core::gateway::client::ApiClient;
use remit_core::gateway::events::PushChannel;
use remit_core::reconcile::Reconciler;
use remit_core::session::Session;
use remit_core::store::EntityStore;

fn tx_list_body(id: Uuid, status: &str) -> String {
    format!(
        r#"{{"transactions": [{{
            "id": "{id}",
            "amount": "125.50",
            "currency": "euro",
            "direction": "FIAT_TO_CHAIN",
            "status": "{status}",
            "funds_in": "BANK_WIRE",
            "funds_out": "CASH",
            "created": "2024-05-01T10:00:00Z"
        }}]}}"#
    )
}

const USER_BODY: &str = r#"{
    "user": {
        "id": "8f14e45f-ceea-467f-a8d5-91ee24eb21ec",
        "kyc_status": "SUBMITTED"
    }
}"#;

async fn mock_gateway(server: &mut mockito::Server, id: Uuid, status: &str) -> (mockito::Mock, mockito::Mock) {
    let me = server
        .mock("GET", "/api/me")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(USER_BODY)
        .create_async()
        .await;
    let txs = server
        .mock("GET", "/api/transactions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(tx_list_body(id, status))
        .create_async()
        .await;
    (me, txs)
}

#[tokio::test]
async fn refresh_overwrites_both_store_slices() {
    let id = Uuid::new_v4();
    let mut server = mockito::Server::new_async().await;
    let _mocks = mock_gateway(&mut server, id, "PROCESSING").await;

    let api = Arc::new(ApiClient::new(server.url(), Session::default()));
    let store = Arc::new(EntityStore::new());
    let reconciler = Reconciler::new(api, store.clone(), Duration::from_secs(15));

    reconciler.refresh().await.unwrap();

    assert_eq!(store.user().unwrap().kyc_status, KycStatus::Submitted);
    assert_eq!(store.transactions().len(), 1);
    assert_eq!(store.snapshot_seq(), 1);
}

#[tokio::test]
async fn authoritative_fetch_wins_over_optimistic_state() {
    let id = Uuid::new_v4();
    let mut server = mockito::Server::new_async().await;
    let _mocks = mock_gateway(&mut server, id, "PROCESSING").await;

    let api = Arc::new(ApiClient::new(server.url(), Session::default()));
    let store = Arc::new(EntityStore::new());
    let reconciler = Reconciler::new(api, store.clone(), Duration::from_secs(15));

    reconciler.refresh().await.unwrap();

    // locally optimistic DEPOSITED...
    let mut optimistic = store.transaction(id).unwrap();
    optimistic.status = remit_core::domain::TransactionStatus::Deposited;
    store.apply_optimistic(optimistic);
    assert_eq!(
        store.transaction(id).unwrap().status,
        remit_core::domain::TransactionStatus::Deposited
    );

    // ...reverts to the server's PROCESSING on the next authoritative fetch
    reconciler.refresh().await.unwrap();
    assert_eq!(
        store.transaction(id).unwrap().status,
        remit_core::domain::TransactionStatus::Processing
    );
}

#[tokio::test]
async fn poll_loop_keeps_refreshing_until_shutdown() {
    let id = Uuid::new_v4();
    let mut server = mockito::Server::new_async().await;
    let _mocks = mock_gateway(&mut server, id, "PROCESSING").await;

    let api = Arc::new(ApiClient::new(server.url(), Session::default()));
    let store = Arc::new(EntityStore::new());
    let reconciler = Arc::new(Reconciler::new(
        api,
        store.clone(),
        Duration::from_millis(50),
    ));

    let handle = reconciler.spawn(None);
    tokio::time::sleep(Duration::from_millis(300)).await;
    let while_running = store.snapshot_seq();
    assert!(while_running >= 2, "expected repeated polls, saw {while_running}");

    // deterministic release: shutdown resolves and polling stops
    handle.shutdown().await;
    let after_shutdown = store.snapshot_seq();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(store.snapshot_seq(), after_shutdown);
}

#[tokio::test]
async fn push_event_triggers_full_refetch() {
    let id = Uuid::new_v4();
    let mut server = mockito::Server::new_async().await;
    let _mocks = mock_gateway(&mut server, id, "PROCESSING").await;
    let _events = server
        .mock("GET", "/api/events")
        .with_status(200)
        .with_body("{\"type\":\"kyc_updated\"}\n{\"type\":\"wallet_updated\"}\n")
        .create_async()
        .await;

    let api = Arc::new(ApiClient::new(server.url(), Session::default()));
    let store = Arc::new(EntityStore::new());
    // long poll period so only the immediate first tick and the two push
    // events can account for snapshots
    let reconciler = Arc::new(Reconciler::new(api, store.clone(), Duration::from_secs(60)));

    let push = PushChannel::new(&server.url(), Session::default());
    let handle = reconciler.spawn(Some(push));

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(
        store.snapshot_seq() >= 3,
        "expected initial poll plus one refetch per push event, saw {}",
        store.snapshot_seq()
    );
    handle.shutdown().await;
}
