//! Notification bus: explicit publish/subscribe for desk events.
//!
//! Subscribers pull from their own channel; the bus never blocks and
//! never calls back into subscriber code. Dropped receivers are pruned
//! on the next publish to their topic.

use crate::{audit::AuditLogEntry, overrides::Override, types::CustomerId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeskEvent {
    DatasetLoaded {
        source: String,
        rows: usize,
        customers: usize,
        dropped_rows: usize,
    },
    OverrideChanged {
        customer_id: CustomerId,
        current: Override,
    },
    AuditRecorded {
        entry: AuditLogEntry,
    },
}

impl DeskEvent {
    pub fn topic(&self) -> Topic {
        match self {
            Self::DatasetLoaded { .. } => Topic::Dataset,
            Self::OverrideChanged { .. } => Topic::Overrides,
            Self::AuditRecorded { .. } => Topic::Audit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Dataset,
    Overrides,
    Audit,
}

#[derive(Debug, Default)]
pub struct NotificationBus {
    subscribers: HashMap<Topic, Vec<Sender<DeskEvent>>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, topic: Topic) -> Receiver<DeskEvent> {
        let (tx, rx) = channel();
        self.subscribers.entry(topic).or_default().push(tx);
        rx
    }

    /// Deliver to every live subscriber of the event's topic.
    /// Returns how many subscribers received it.
    pub fn publish(&mut self, event: DeskEvent) -> usize {
        let Some(senders) = self.subscribers.get_mut(&event.topic()) else {
            return 0;
        };
        senders.retain(|tx| tx.send(event.clone()).is_ok());
        senders.len()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.subscribers.get(&topic).map_or(0, Vec::len)
    }
}
