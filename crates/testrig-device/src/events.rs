//! Lifecycle events published by a device instance.
//!
//! A thin fan-out over unbounded channels: subscribers outlive nothing, and a
//! dropped receiver is pruned on the next publish. The only ordering
//! guarantee is that `AppReady` is published after the process is confirmed
//! started.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use testrig_types::{BundleId, DeviceId, ProcessId};

/// A lifecycle event for one device instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceEvent {
    /// A new application process was cold-launched and is ready.
    ///
    /// Published exactly once per successful cold launch; never on warm
    /// delivery (same process, no new readiness) or manual wait.
    AppReady {
        device_id: DeviceId,
        bundle_id: BundleId,
        pid: ProcessId,
    },
}

/// Fan-out publisher for [`DeviceEvent`]s.
#[derive(Debug, Default)]
pub struct EventPublisher {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<DeviceEvent>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber and return its receiving end.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<DeviceEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .expect("event subscriber list poisoned")
            .push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber, dropping closed ones.
    pub fn publish(&self, event: DeviceEvent) {
        debug!(?event, "publishing device event");
        self.subscribers
            .lock()
            .expect("event subscriber list poisoned")
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_ready(pid: i32) -> DeviceEvent {
        DeviceEvent::AppReady {
            device_id: DeviceId::new("sim-1"),
            bundle_id: BundleId::new("com.example.app"),
            pid: ProcessId(pid),
        }
    }

    #[test]
    fn publish_reaches_every_subscriber() {
        let publisher = EventPublisher::new();
        let mut rx1 = publisher.subscribe();
        let mut rx2 = publisher.subscribe();

        publisher.publish(app_ready(1));

        assert_eq!(rx1.try_recv().unwrap(), app_ready(1));
        assert_eq!(rx2.try_recv().unwrap(), app_ready(1));
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let publisher = EventPublisher::new();
        let rx = publisher.subscribe();
        drop(rx);

        let mut live = publisher.subscribe();
        publisher.publish(app_ready(2));
        assert_eq!(live.try_recv().unwrap(), app_ready(2));
    }

    #[test]
    fn app_ready_serializes_with_tag() {
        let json = serde_json::to_value(app_ready(42)).unwrap();
        assert_eq!(json["type"], "app_ready");
        assert_eq!(json["pid"], 42);
    }
}
