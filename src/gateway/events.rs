//! Push channel: a long-lived NDJSON event stream from the gateway.
//!
//! Events carry only a change-kind tag, never a payload; the reconciliation
//! engine answers each one with a full authoritative re-fetch.

use std::time::Duration;

use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

use crate::session::Session;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Typed change notification pushed by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEvent {
    KycUpdated,
    WalletUpdated,
}

/// Client side of the push feed. Forwards parsed events into an mpsc
/// channel until shut down; lines it cannot parse are skipped.
pub struct PushChannel {
    client: Client,
    events_url: String,
    session: Session,
}

impl PushChannel {
    pub fn new(base_url: &str, session: Session) -> Self {
        // no global timeout: the stream stays open indefinitely
        let client = Client::builder().build().unwrap_or_default();
        Self {
            client,
            events_url: format!("{}/api/events", base_url.trim_end_matches('/')),
            session,
        }
    }

    /// Runs until `shutdown` flips, reconnecting with a fixed delay when
    /// the stream drops.
    pub async fn run(self, events: mpsc::Sender<PushEvent>, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                res = self.consume(&events) => {
                    if let Err(e) = res {
                        tracing::warn!("push channel error: {e}");
                    }
                    if events.is_closed() {
                        break;
                    }
                    tokio::select! {
                        _ = shutdown.changed() => break,
                        _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                    }
                }
            }
        }
        tracing::debug!("push channel stopped");
    }

    async fn consume(&self, events: &mpsc::Sender<PushEvent>) -> Result<(), reqwest::Error> {
        let mut request = self.client.get(&self.events_url);
        if let Some(auth) = self.session.authorization() {
            request = request.header("Authorization", auth);
        }

        let response = request.send().await?.error_for_status()?;
        let mut stream = response.bytes_stream();
        let mut buf: Vec<u8> = Vec::new();

        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk?);
            while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buf.drain(..=pos).collect();
                match serde_json::from_slice::<PushEvent>(&line) {
                    Ok(event) => {
                        if events.send(event).await.is_err() {
                            // consumer gone, nothing left to forward to
                            return Ok(());
                        }
                    }
                    Err(_) => tracing::trace!("ignoring unknown push payload"),
                }
            }
        }
        Ok(())
    }
}
