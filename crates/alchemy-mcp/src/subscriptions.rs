//! Subscription registry and event delivery
//!
//! The registry maps locally generated ids to the backend's cancel action.
//! Events flow one way, from backend reader tasks through a bounded channel to
//! a logging task, and never touch the request/response path.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use alchemy_client::{CancelHandle, EventCallback, SubscriptionRequest};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

/// Kind of standing event registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SubscriptionKind {
    NewHeads,
    Logs,
    PendingTransactions,
}

impl SubscriptionKind {
    pub const NAMES: &'static [&'static str] = &["newHeads", "logs", "pendingTransactions"];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionKind::NewHeads => "newHeads",
            SubscriptionKind::Logs => "logs",
            SubscriptionKind::PendingTransactions => "pendingTransactions",
        }
    }

    /// Backend request; the filter only applies to `Logs`
    pub fn request(
        &self,
        address: Option<String>,
        topics: Option<Vec<Value>>,
    ) -> SubscriptionRequest {
        match self {
            SubscriptionKind::NewHeads => SubscriptionRequest::NewHeads,
            SubscriptionKind::Logs => SubscriptionRequest::Logs { address, topics },
            SubscriptionKind::PendingTransactions => SubscriptionRequest::PendingTransactions,
        }
    }
}

impl fmt::Display for SubscriptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newHeads" => Ok(SubscriptionKind::NewHeads),
            "logs" => Ok(SubscriptionKind::Logs),
            "pendingTransactions" => Ok(SubscriptionKind::PendingTransactions),
            other => Err(format!("unknown subscription type '{}'", other)),
        }
    }
}

/// A live subscription and the action that ends it
#[derive(Debug)]
pub struct SubscriptionHandle {
    pub id: String,
    pub kind: SubscriptionKind,
    pub created_at: DateTime<Utc>,
    pub cancel: CancelHandle,
}

impl SubscriptionHandle {
    pub fn new(id: String, kind: SubscriptionKind, cancel: CancelHandle) -> Self {
        Self {
            id,
            kind,
            created_at: Utc::now(),
            cancel,
        }
    }
}

/// Listing entry for a live subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSummary {
    pub subscription_id: String,
    #[serde(rename = "type")]
    pub kind: SubscriptionKind,
    pub created_at: DateTime<Utc>,
}

/// Live subscriptions keyed by id.
///
/// Holds an entry exactly while the backend subscription is live: inserted
/// after the backend accepted it, removed when its cancel action runs.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    entries: Mutex<HashMap<String, SubscriptionHandle>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, handle: SubscriptionHandle) {
        self.entries.lock().await.insert(handle.id.clone(), handle);
    }

    pub async fn remove(&self, id: &str) -> Option<SubscriptionHandle> {
        self.entries.lock().await.remove(id)
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.entries.lock().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Oldest first
    pub async fn snapshot(&self) -> Vec<SubscriptionSummary> {
        let mut summaries: Vec<_> = self
            .entries
            .lock()
            .await
            .values()
            .map(|handle| SubscriptionSummary {
                subscription_id: handle.id.clone(),
                kind: handle.kind,
                created_at: handle.created_at,
            })
            .collect();
        summaries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.subscription_id.cmp(&b.subscription_id))
        });
        summaries
    }

    /// Cancel everything. Best effort; returns how many cancels failed.
    pub async fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self.entries.lock().await.drain().map(|(_, h)| h).collect();

        let mut failures = 0;
        for handle in drained {
            match handle.cancel.cancel() {
                Ok(()) => info!(subscription_id = %handle.id, kind = %handle.kind, "Subscription cancelled"),
                Err(e) => {
                    failures += 1;
                    warn!(subscription_id = %handle.id, "Cancel failed: {}", e);
                }
            }
        }
        failures
    }
}

/// One event received on a subscription
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionEvent {
    pub subscription_id: String,
    #[serde(rename = "type")]
    pub kind: SubscriptionKind,
    pub payload: Value,
}

/// Sending side of the event channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventObserver {
    sender: mpsc::Sender<SubscriptionEvent>,
}

impl EventObserver {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SubscriptionEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Never blocks; drops the event if the channel is full or closed
    pub fn emit(&self, event: SubscriptionEvent) {
        if let Err(e) = self.sender.try_send(event) {
            let reason = match &e {
                mpsc::error::TrySendError::Full(_) => "channel full",
                mpsc::error::TrySendError::Closed(_) => "channel closed",
            };
            let event = e.into_inner();
            warn!(
                subscription_id = %event.subscription_id,
                kind = %event.kind,
                "Dropping subscription event: {}", reason
            );
        }
    }

    /// Backend callback that tags each payload with the subscription id
    pub fn callback(&self, id: String, kind: SubscriptionKind) -> EventCallback {
        let observer = self.clone();
        Arc::new(move |payload| {
            observer.emit(SubscriptionEvent {
                subscription_id: id.clone(),
                kind,
                payload,
            })
        })
    }
}

/// Drain the event channel into the log until every sender is gone
pub async fn log_events(mut receiver: mpsc::Receiver<SubscriptionEvent>) {
    while let Some(event) = receiver.recv().await {
        info!(
            subscription_id = %event.subscription_id,
            kind = %event.kind,
            payload = %event.payload,
            "Subscription event"
        );
    }
}
