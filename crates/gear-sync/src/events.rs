//! Change notifications for observers of a list

use gear_order::{ContainerId, EntryId, ListId, Scope};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::coordinator::MovePhase;

/// Something observable happened to the list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ListEvent {
    /// An operation entered a new phase
    Phase {
        operation: u64,
        kind: &'static str,
        phase: MovePhase,
        scopes: Vec<Scope>,
    },
    /// The whole list was re-read from the store
    Refreshed { list_id: ListId },
    EntryAdded {
        entry_id: EntryId,
        container_id: ContainerId,
    },
    EntryRemoved {
        entry_id: EntryId,
        container_id: ContainerId,
    },
    ContainerAdded { container_id: ContainerId },
    ContainerRemoved { container_id: ContainerId },
    ContainerRenamed {
        container_id: ContainerId,
        title: String,
    },
}

/// Broadcast channel fanning events out to subscribers.
///
/// Publishing never blocks; slow subscribers lose the oldest events.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ListEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ListEvent> {
        self.sender.subscribe()
    }

    /// Send to all current subscribers, returning how many received it
    pub fn publish(&self, event: ListEvent) -> usize {
        tracing::trace!(?event, "Publishing list event");
        self.sender.send(event).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();

        let event = ListEvent::ContainerAdded {
            container_id: ContainerId::from("water"),
        };
        assert_eq!(bus.publish(event.clone()), 1);
        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::new(4);
        let sent = bus.publish(ListEvent::Refreshed {
            list_id: ListId::from("pct"),
        });
        assert_eq!(sent, 0);
    }

    #[test]
    fn events_serialize_with_a_tag() {
        let json = serde_json::to_value(ListEvent::ContainerRemoved {
            container_id: ContainerId::from("water"),
        })
        .unwrap();
        assert_eq!(json["event"], "container_removed");
        assert_eq!(json["container_id"], "water");
    }
}
