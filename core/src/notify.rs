//! Notification sink
//!
//! State-change events are pushed to a `NotificationSink` after a transition
//! commits. Delivery is fire-and-forget: implementations must swallow their
//! own failures — a broken push channel never rolls back a lifecycle
//! transition.

use crate::models::ids::{DriverId, RideId, UserId};
use serde::{Deserialize, Serialize};

/// A state-change event worth telling a user about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NotificationEvent {
    RideAccepted { ride_id: RideId, driver_id: DriverId },
    DriverArrived { ride_id: RideId },
    TripStarted { ride_id: RideId },
    TripCompleted { ride_id: RideId, final_price: i64 },
    RideCancelled { ride_id: RideId },
}

/// Fire-and-forget delivery of state-change events.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, user_id: &UserId, event: NotificationEvent);
}

/// Discards everything. The default when no delivery channel is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl NotificationSink for NoopNotifier {
    fn notify(&self, user_id: &UserId, event: NotificationEvent) {
        tracing::trace!(user = %user_id, ?event, "notification dropped (noop sink)");
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Records notifications for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        pub delivered: Mutex<Vec<(UserId, NotificationEvent)>>,
    }

    impl NotificationSink for RecordingNotifier {
        fn notify(&self, user_id: &UserId, event: NotificationEvent) {
            self.delivered
                .lock()
                .expect("notifier lock")
                .push((user_id.clone(), event));
        }
    }
}
