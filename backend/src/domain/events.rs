//! Change notifications for consumers that want to react to store mutations.

use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    BabyChanged { baby_id: Uuid },
    BabyDeleted { baby_id: Uuid },
    ActiveBabyChanged { baby_id: Option<Uuid> },
    ActivityChanged { baby_id: Uuid, activity_id: Uuid },
    MediaChanged { media_id: Uuid },
    SettingsChanged,
    AnalysisCompleted { media_id: Uuid, result_id: Uuid },
}

/// Broadcast channel shared by all services
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: StoreEvent) {
        trace!("Publishing {:?}", event);
        let _ = self.sender.send(event);
    }
}
