//! Ride model
//!
//! A ride is one transportation request from origin to destination, tracked
//! through the lifecycle state machine:
//!
//! ```text
//! Requested ──► Accepted ──► Arrived ──► InProgress ──► Completed
//!     │             │           │             │
//!     └─────────────┴───────────┴─────────────┴──► Cancelled
//! ```
//!
//! Transitions are monotonic: Completed and Cancelled are terminal, and no
//! edge ever moves backwards. The transition functions in `lifecycle` enforce
//! the graph; this module only declares it.
//!
//! CRITICAL: All money values are i64 (cents)

use crate::geo::GeoPoint;
use crate::models::ids::{DriverId, RideId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle state of a ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RideStatus {
    /// Created, waiting for a driver.
    Requested,
    /// A driver accepted and is heading to the pickup point.
    Accepted,
    /// The driver reported arrival at the pickup point.
    Arrived,
    /// The trip is underway.
    InProgress,
    /// The trip finished; terminal.
    Completed,
    /// Cancelled by a party or by the reconciler; terminal.
    Cancelled,
}

impl RideStatus {
    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: RideStatus) -> bool {
        use RideStatus::*;
        matches!(
            (self, next),
            (Requested, Accepted)
                | (Requested, Cancelled)
                | (Accepted, Arrived)
                | (Accepted, Cancelled)
                | (Arrived, InProgress)
                | (Arrived, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
        )
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }
}

/// Category of service requested by the passenger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RideType {
    Standard,
    Executive,
    Armored,
    FemaleOnly,
    PetFriendly,
}

/// How the passenger intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Internal wallet; settled by the ledger transfer.
    Wallet,
    /// Cash handed to the driver; settled on driver confirmation.
    Cash,
    /// External card; settled on driver confirmation.
    Card,
}

/// Who is performing a lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    Passenger(UserId),
    Driver(DriverId),
    /// The reconciler or another internal process.
    System,
}

/// Errors from lifecycle operations.
#[derive(Debug, Error, PartialEq)]
pub enum RideError {
    #[error("ride {0} not found")]
    RideNotFound(RideId),

    #[error("driver {0} not found")]
    DriverNotFound(DriverId),

    #[error("transition {from:?} -> {to:?} is not allowed")]
    InvalidTransition { from: RideStatus, to: RideStatus },

    #[error("ride is in {actual:?}, expected {expected:?}; re-fetch and retry")]
    StaleState {
        expected: RideStatus,
        actual: RideStatus,
    },

    #[error("actor is not allowed to perform this transition")]
    WrongActor,

    #[error("driver {0} is not available for dispatch")]
    DriverUnavailable(DriverId),

    #[error("ride has no assigned driver")]
    MissingDriver,
}

/// One transportation request.
///
/// Invariants maintained by the lifecycle functions:
/// - `driver_id` is `Some` in every state after `Requested`
/// - `final_price` is `Some` only in `Completed`
/// - each timestamp is set exactly once, when its state is entered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ride {
    id: RideId,
    passenger_id: UserId,
    driver_id: Option<DriverId>,
    status: RideStatus,
    ride_type: RideType,
    payment_method: PaymentMethod,

    origin: GeoPoint,
    origin_address: String,
    destination: GeoPoint,
    destination_address: String,

    /// Quoted at request time from the straight-line estimate (cents).
    estimated_price: i64,
    /// Set when the trip completes, from actual distance/duration (cents).
    final_price: Option<i64>,
    /// Surge multiplier captured at request time, applied at pricing.
    surge_multiplier: f64,

    created_at: DateTime<Utc>,
    accepted_at: Option<DateTime<Utc>>,
    arrived_at: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
    dropped_off_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl Ride {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        passenger_id: UserId,
        origin: GeoPoint,
        origin_address: String,
        destination: GeoPoint,
        destination_address: String,
        ride_type: RideType,
        payment_method: PaymentMethod,
        estimated_price: i64,
        surge_multiplier: f64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RideId::new(),
            passenger_id,
            driver_id: None,
            status: RideStatus::Requested,
            ride_type,
            payment_method,
            origin,
            origin_address,
            destination,
            destination_address,
            estimated_price,
            final_price: None,
            surge_multiplier,
            created_at,
            accepted_at: None,
            arrived_at: None,
            started_at: None,
            dropped_off_at: None,
            cancelled_at: None,
        }
    }

    pub fn id(&self) -> &RideId {
        &self.id
    }

    pub fn passenger_id(&self) -> &UserId {
        &self.passenger_id
    }

    pub fn driver_id(&self) -> Option<&DriverId> {
        self.driver_id.as_ref()
    }

    pub fn status(&self) -> RideStatus {
        self.status
    }

    pub fn ride_type(&self) -> RideType {
        self.ride_type
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn origin(&self) -> GeoPoint {
        self.origin
    }

    pub fn origin_address(&self) -> &str {
        &self.origin_address
    }

    pub fn destination(&self) -> GeoPoint {
        self.destination
    }

    pub fn destination_address(&self) -> &str {
        &self.destination_address
    }

    pub fn estimated_price(&self) -> i64 {
        self.estimated_price
    }

    pub fn final_price(&self) -> Option<i64> {
        self.final_price
    }

    pub fn surge_multiplier(&self) -> f64 {
        self.surge_multiplier
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn accepted_at(&self) -> Option<DateTime<Utc>> {
        self.accepted_at
    }

    pub fn arrived_at(&self) -> Option<DateTime<Utc>> {
        self.arrived_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn dropped_off_at(&self) -> Option<DateTime<Utc>> {
        self.dropped_off_at
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    // -------------------------------------------------------------------
    // State mutation. Crate-private: only the lifecycle module drives the
    // machine; everything else reads.
    // -------------------------------------------------------------------

    /// Move to `next` after the caller validated the edge. Panics (debug) on
    /// an illegal edge to catch lifecycle bugs early.
    pub(crate) fn set_status(&mut self, next: RideStatus) {
        debug_assert!(
            self.status.can_transition_to(next),
            "illegal edge {:?} -> {:?}",
            self.status,
            next
        );
        self.status = next;
    }

    pub(crate) fn assign_driver(&mut self, driver_id: DriverId, at: DateTime<Utc>) {
        self.driver_id = Some(driver_id);
        self.accepted_at = Some(at);
    }

    pub(crate) fn mark_arrived(&mut self, at: DateTime<Utc>) {
        self.arrived_at = Some(at);
    }

    pub(crate) fn mark_started(&mut self, at: DateTime<Utc>) {
        self.started_at = Some(at);
    }

    pub(crate) fn mark_completed(&mut self, final_price: i64, at: DateTime<Utc>) {
        self.final_price = Some(final_price);
        self.dropped_off_at = Some(at);
    }

    pub(crate) fn mark_cancelled(&mut self, at: DateTime<Utc>) {
        self.cancelled_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_edges_match_the_graph() {
        use RideStatus::*;
        assert!(Requested.can_transition_to(Accepted));
        assert!(Requested.can_transition_to(Cancelled));
        assert!(Accepted.can_transition_to(Arrived));
        assert!(Accepted.can_transition_to(Cancelled));
        assert!(Arrived.can_transition_to(InProgress));
        assert!(Arrived.can_transition_to(Cancelled));
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Cancelled));
    }

    #[test]
    fn no_backward_or_skipping_edges() {
        use RideStatus::*;
        assert!(!Requested.can_transition_to(Arrived));
        assert!(!Requested.can_transition_to(InProgress));
        assert!(!Requested.can_transition_to(Completed));
        assert!(!Accepted.can_transition_to(Requested));
        assert!(!Accepted.can_transition_to(InProgress));
        assert!(!Arrived.can_transition_to(Accepted));
        assert!(!InProgress.can_transition_to(Arrived));
    }

    #[test]
    fn terminal_states_admit_nothing() {
        use RideStatus::*;
        for next in [Requested, Accepted, Arrived, InProgress, Completed, Cancelled] {
            assert!(!Completed.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
        assert!(Completed.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!InProgress.is_terminal());
    }
}
