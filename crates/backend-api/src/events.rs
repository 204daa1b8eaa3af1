//! In-process event broker behind the realtime stream.
//!
//! One broker is constructed at startup and injected through
//! [`crate::AppState`]. Published events land in a bounded backlog and on
//! a broadcast channel; a new subscriber first receives the backlog
//! snapshot, then live events from its own receiver. Nothing is cleared
//! on delivery, so concurrent subscribers see the same events. Events are
//! never persisted and do not survive a restart.

use std::collections::VecDeque;
use std::sync::Arc;

use billbuddy_auth::Claims;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, Mutex};

const DEFAULT_BACKLOG_CAPACITY: usize = 256;
const CHANNEL_CAPACITY: usize = 256;

/// A published event, stamped with its publisher's identity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub payload: Value,
    pub timestamp: String,
    pub user_id: String,
    pub household_id: Option<String>,
}

#[derive(Clone)]
pub struct EventBroker {
    backlog: Arc<Mutex<VecDeque<RealtimeEvent>>>,
    tx: broadcast::Sender<RealtimeEvent>,
    backlog_capacity: usize,
}

impl EventBroker {
    pub fn new(backlog_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            backlog: Arc::new(Mutex::new(VecDeque::new())),
            tx,
            backlog_capacity,
        }
    }

    /// Stamp and enqueue an event, waking every live subscriber. The
    /// oldest backlog entry is dropped once the capacity is reached.
    pub async fn publish(
        &self,
        event_type: String,
        payload: Value,
        publisher: &Claims,
    ) -> RealtimeEvent {
        let event = RealtimeEvent {
            event_type,
            payload,
            timestamp: Utc::now().to_rfc3339(),
            user_id: publisher.sub.clone(),
            household_id: publisher.household_id.clone(),
        };

        let mut backlog = self.backlog.lock().await;
        if backlog.len() >= self.backlog_capacity {
            backlog.pop_front();
        }
        backlog.push_back(event.clone());
        // Send while holding the lock so a concurrent subscriber sees an
        // event either in its snapshot or on its receiver, never neither.
        let _ = self.tx.send(event.clone());

        event
    }

    /// Snapshot of everything published so far plus a receiver for what
    /// comes next.
    pub async fn subscribe(&self) -> (Vec<RealtimeEvent>, broadcast::Receiver<RealtimeEvent>) {
        let backlog = self.backlog.lock().await;
        let rx = self.tx.subscribe();
        (backlog.iter().cloned().collect(), rx)
    }
}

impl Default for EventBroker {
    fn default() -> Self {
        Self::new(DEFAULT_BACKLOG_CAPACITY)
    }
}
