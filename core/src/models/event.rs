//! Ride status history
//!
//! Every lifecycle transition appends one `RideEvent`. Records for a given
//! ride are strictly chronological (the engine timestamps them from a single
//! clock before persisting), which is what makes the monotonicity property
//! checkable after the fact.

use crate::models::ids::RideId;
use crate::models::ride::{Actor, RideStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One status-history record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideEvent {
    pub ride_id: RideId,
    /// `None` for the creation record.
    pub from: Option<RideStatus>,
    pub to: RideStatus,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

/// Append-only log of status-history records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<RideEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event to the log.
    pub fn log(&mut self, event: RideEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[RideEvent] {
        &self.events
    }

    /// History for one ride, in append order.
    pub fn events_for_ride(&self, ride_id: &RideId) -> Vec<&RideEvent> {
        self.events.iter().filter(|e| &e.ride_id == ride_id).collect()
    }

    /// Drop all records for a ride. Only the reconciler's cleanup of
    /// abandoned rides uses this; history is otherwise immutable.
    pub fn purge_ride(&mut self, ride_id: &RideId) -> usize {
        let before = self.events.len();
        self.events.retain(|e| &e.ride_id != ride_id);
        before - self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(ride: &str, to: RideStatus) -> RideEvent {
        RideEvent {
            ride_id: RideId::from(ride),
            from: None,
            to,
            actor: Actor::System,
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn events_are_appended_in_order() {
        let mut log = EventLog::new();
        log.log(event("r1", RideStatus::Requested));
        log.log(event("r2", RideStatus::Requested));
        log.log(event("r1", RideStatus::Accepted));

        let r1 = log.events_for_ride(&RideId::from("r1"));
        assert_eq!(r1.len(), 2);
        assert_eq!(r1[0].to, RideStatus::Requested);
        assert_eq!(r1[1].to, RideStatus::Accepted);
    }

    #[test]
    fn purge_removes_only_the_target_ride() {
        let mut log = EventLog::new();
        log.log(event("r1", RideStatus::Requested));
        log.log(event("r2", RideStatus::Requested));

        assert_eq!(log.purge_ride(&RideId::from("r1")), 1);
        assert!(log.events_for_ride(&RideId::from("r1")).is_empty());
        assert_eq!(log.events_for_ride(&RideId::from("r2")).len(), 1);
    }
}
