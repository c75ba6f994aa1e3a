//! In-memory entity store: the single source of truth for rendering.
//!
//! Authoritative fetches replace whole slices, so concurrent fetch races
//! are benign (last completed fetch wins). A per-id optimistic overlay
//! carries local state only until the next authoritative snapshot arrives.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use uuid::Uuid;

use crate::domain::{Transaction, User};

#[derive(Default)]
pub struct EntityStore {
    user: ArcSwapOption<User>,
    transactions: ArcSwap<Vec<Transaction>>,
    pending: ArcSwap<HashMap<Uuid, Transaction>>,
    snapshot_seq: AtomicU64,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the user slice with an authoritative snapshot.
    pub fn apply_user_snapshot(&self, user: Option<User>) {
        self.user.store(user.map(Arc::new));
    }

    /// Replaces the transaction slice with an authoritative snapshot and
    /// drops the optimistic overlay wholesale; the server always wins.
    pub fn apply_transactions_snapshot(&self, transactions: Vec<Transaction>) {
        self.pending.store(Arc::new(HashMap::new()));
        self.transactions.store(Arc::new(transactions));
        self.snapshot_seq.fetch_add(1, Ordering::Relaxed);
    }

    /// Upserts one server-acknowledged record: atomic by-id replace, never
    /// a duplicate. Any optimistic state for the id is superseded.
    pub fn apply_canonical(&self, tx: Transaction) {
        self.pending.rcu(|pending| {
            let mut next = HashMap::clone(pending);
            next.remove(&tx.id);
            next
        });
        self.transactions.rcu(|current| {
            let mut next = Vec::clone(current);
            match next.iter_mut().find(|t| t.id == tx.id) {
                Some(slot) => *slot = tx.clone(),
                None => next.push(tx.clone()),
            }
            next
        });
    }

    /// Records a locally optimistic record; the next authoritative
    /// snapshot overwrites it.
    pub fn apply_optimistic(&self, tx: Transaction) {
        self.pending.rcu(|pending| {
            let mut next = HashMap::clone(pending);
            next.insert(tx.id, tx.clone());
            next
        });
    }

    pub fn user(&self) -> Option<Arc<User>> {
        self.user.load_full()
    }

    /// Transactions as the UI should see them: the authoritative snapshot
    /// with the optimistic overlay applied per id.
    pub fn transactions(&self) -> Vec<Transaction> {
        let pending = self.pending.load();
        self.transactions
            .load()
            .iter()
            .map(|tx| pending.get(&tx.id).cloned().unwrap_or_else(|| tx.clone()))
            .collect()
    }

    pub fn transaction(&self, id: Uuid) -> Option<Transaction> {
        if let Some(tx) = self.pending.load().get(&id) {
            return Some(tx.clone());
        }
        self.transactions.load().iter().find(|t| t.id == id).cloned()
    }

    /// Count of applied authoritative transaction snapshots.
    pub fn snapshot_seq(&self) -> u64 {
        self.snapshot_seq.load(Ordering::Relaxed)
    }
}
