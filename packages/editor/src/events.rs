//! # Editor events
//!
//! Informational notices produced while editing. None of them is an error:
//! the edit has already been applied and the document is consistent.
//!
//! Events are returned to the caller in every [`CommandResult`] and also
//! published to any number of subscribers (a UI, an autosave task) over a
//! tokio broadcast channel.

use scriptory_document::BlockId;
use scriptory_templates::{NumberingClass, TemplateWarning};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenumberReason {
    /// Blocks were inserted, removed, moved or retyped
    Structural,

    /// A lock state changed
    LockChanged,

    /// Two blocks shared a number; the class was renumbered in full
    Conflict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditorEvent {
    RenumberPerformed {
        class: NumberingClass,
        reason: RenumberReason,
        /// Blocks whose label changed, in document order
        blocks: Vec<BlockId>,
    },

    /// A block is taller than a page and was placed on its own
    OverflowWarning { block: BlockId, page: u32 },

    /// A split gained its `(MORE)` / `CONT'D` pair
    MarkerInserted {
        block: BlockId,
        /// Page carrying `(MORE)`
        page: u32,
        split_offset: usize,
        speaker: Option<String>,
    },

    MarkerRemoved {
        block: BlockId,
        page: u32,
        split_offset: usize,
    },

    /// The document's template could not be used as is
    TemplateFallback { warning: TemplateWarning },
}

/// Outcome of `apply`, `undo` and `redo`
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    /// Document version after the operation
    pub version: u64,

    /// Blocks changed by the operation, including renumbered ones
    pub touched: Vec<BlockId>,

    pub events: Vec<EditorEvent>,
}

/// Fan-out of editor events to subscribers
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EditorEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn publish(&self, events: &[EditorEvent]) {
        for event in events {
            // Sending only fails when nobody listens
            if self.sender.send(event.clone()).is_err() {
                debug!("No event subscribers");
                break;
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = EditorEvent::RenumberPerformed {
            class: NumberingClass::Scene,
            reason: RenumberReason::Conflict,
            blocks: vec![BlockId(4)],
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"renumber_performed\""));
        assert!(json.contains("\"reason\":\"conflict\""));
        assert_eq!(serde_json::from_str::<EditorEvent>(&json).unwrap(), event);
    }

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let bus = EventBus::new(8);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let event = EditorEvent::OverflowWarning {
            block: BlockId(1),
            page: 3,
        };
        bus.publish(&[event.clone()]);

        assert_eq!(first.try_recv().unwrap(), event);
        assert_eq!(second.try_recv().unwrap(), event);
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        EventBus::default().publish(&[EditorEvent::OverflowWarning {
            block: BlockId(1),
            page: 1,
        }]);
    }
}
