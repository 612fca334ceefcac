//! Dispatch engine
//!
//! The facade that ties the pieces together: it owns the `DispatchState`,
//! the geo index, and the pluggable collaborators (clock, pricing,
//! eligibility, notifications), and exposes the operations external surfaces
//! call — request a ride, drive it through its lifecycle, settle it, and run
//! the reconciliation sweeps.
//!
//! The engine also keeps the geo index consistent with driver state: a
//! driver is indexed exactly while dispatchable, so matching never offers a
//! ride to someone who cannot take it. Notifications go out only after a
//! transition has committed.

use crate::config::EngineConfig;
use crate::core::clock::{Clock, SystemClock};
use crate::geo::{haversine_km, GeoIndex, GeoPoint};
use crate::lifecycle;
use crate::matching::{DispatchMatcher, MatchError, RideTypeEligibility, VehicleEligibility};
use crate::models::driver::{Driver, VehicleProfile};
use crate::models::ids::{DriverId, RideId, UserId};
use crate::models::ride::{Actor, PaymentMethod, Ride, RideError, RideStatus, RideType};
use crate::models::state::DispatchState;
use crate::notify::{NoopNotifier, NotificationEvent, NotificationSink};
use crate::pricing::{DistanceTimePricing, PricingPolicy};
use crate::reconciler::{self, StaleSweepOutcome, SweepReport};
use crate::settlement::{self, SettlementError, SettlementResult};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid coordinates for {field}")]
    InvalidLocation { field: &'static str },

    #[error("driver {0} not found")]
    DriverNotFound(DriverId),

    #[error(transparent)]
    Ride(#[from] RideError),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Settlement(#[from] SettlementError),
}

/// A passenger's ride request, as received from the outer surface.
#[derive(Debug, Clone)]
pub struct RideRequest {
    pub passenger_id: UserId,
    pub origin: GeoPoint,
    pub origin_address: String,
    pub destination: GeoPoint,
    pub destination_address: String,
    pub ride_type: RideType,
    pub payment_method: PaymentMethod,
    /// Surge multiplier in effect at request time (1.0 = none).
    pub surge_multiplier: f64,
}

/// What happened to a freshly requested ride.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// A driver accepted; the ride is in Accepted.
    Dispatched {
        ride_id: RideId,
        driver_id: DriverId,
        estimated_price: i64,
    },
    /// No driver could be found; the ride stays Requested for the
    /// reconciler to expire.
    NoDriverAvailable {
        ride_id: RideId,
        estimated_price: i64,
    },
}

impl DispatchOutcome {
    pub fn ride_id(&self) -> &RideId {
        match self {
            DispatchOutcome::Dispatched { ride_id, .. } => ride_id,
            DispatchOutcome::NoDriverAvailable { ride_id, .. } => ride_id,
        }
    }
}

/// A driver's answer to a ride offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverDecision {
    Accept,
    Decline,
}

/// Lifecycle trigger applied through [`DispatchEngine::transition`].
#[derive(Debug, Clone, PartialEq)]
pub enum RideTrigger {
    /// Driver reports arrival at the pickup point.
    Arrive,
    /// Driver starts the trip.
    Start,
    /// Driver ends the trip with the actual distance and duration.
    Complete { distance_km: f64, duration_min: f64 },
    /// Any permitted party cancels.
    Cancel,
}

/// Settlement outcome attached to a completion transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostCompletionSettlement {
    Settled { fare: i64, fee: i64, net: i64 },
    /// The payment was already Paid; no funds moved in this call.
    AlreadySettled,
    AwaitingDriverConfirmation,
    /// Wallet too low; the payment stays Pending for the repair sweep.
    InsufficientFunds { required: i64, available: i64 },
}

/// Result of a successful transition: the ride as it now stands, plus the
/// settlement outcome when the transition was a completion.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub ride: Ride,
    pub settlement: Option<PostCompletionSettlement>,
}

/// The dispatch engine. See the module docs.
pub struct DispatchEngine {
    state: DispatchState,
    geo: GeoIndex,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    pricing: Box<dyn PricingPolicy>,
    eligibility: Box<dyn RideTypeEligibility>,
    matcher: DispatchMatcher,
    notifier: Arc<dyn NotificationSink>,
}

impl DispatchEngine {
    /// Engine with production defaults: system clock, distance-time pricing,
    /// vehicle-profile eligibility, no notification delivery.
    pub fn new(config: EngineConfig) -> Self {
        let matcher = DispatchMatcher::new(&config);
        let geo = GeoIndex::new(config.geo_cell_size_deg);
        let pricing = DistanceTimePricing::from_config(&config);
        Self {
            state: DispatchState::new(),
            geo,
            config,
            clock: Arc::new(SystemClock),
            pricing: Box::new(pricing),
            eligibility: Box::new(VehicleEligibility),
            matcher,
            notifier: Arc::new(NoopNotifier),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_pricing(mut self, pricing: Box<dyn PricingPolicy>) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_eligibility(mut self, eligibility: Box<dyn RideTypeEligibility>) -> Self {
        self.eligibility = eligibility;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    /// Direct state access for wallet top-ups and test fixtures.
    pub fn state_mut(&mut self) -> &mut DispatchState {
        &mut self.state
    }

    pub fn geo(&self) -> &GeoIndex {
        &self.geo
    }

    // -- Driver feed -----------------------------------------------------

    /// Register a new driver, initially offline.
    pub fn register_driver(
        &mut self,
        user_id: UserId,
        location: GeoPoint,
        profile: VehicleProfile,
    ) -> Result<DriverId, EngineError> {
        if !location.is_valid() {
            return Err(EngineError::InvalidLocation { field: "location" });
        }
        let driver = Driver::new(user_id, location, profile);
        let driver_id = driver.id().clone();
        self.state.add_driver(driver);
        tracing::debug!(driver = %driver_id, "driver registered");
        Ok(driver_id)
    }

    /// Driver goes online or offline.
    pub fn set_driver_online(
        &mut self,
        driver_id: &DriverId,
        online: bool,
    ) -> Result<(), EngineError> {
        let driver = self
            .state
            .get_driver_mut(driver_id)
            .ok_or_else(|| EngineError::DriverNotFound(driver_id.clone()))?;
        driver.set_online(online);
        self.sync_driver_geo(driver_id);
        Ok(())
    }

    /// Location ping from a driver's device.
    pub fn update_driver_location(
        &mut self,
        driver_id: &DriverId,
        location: GeoPoint,
    ) -> Result<(), EngineError> {
        if !location.is_valid() {
            return Err(EngineError::InvalidLocation { field: "location" });
        }
        let driver = self
            .state
            .get_driver_mut(driver_id)
            .ok_or_else(|| EngineError::DriverNotFound(driver_id.clone()))?;
        driver.set_location(location);
        self.sync_driver_geo(driver_id);
        Ok(())
    }

    /// Make index membership match dispatchability. Call after anything that
    /// may have changed the driver's flags or position.
    fn sync_driver_geo(&mut self, driver_id: &DriverId) {
        match self.state.get_driver(driver_id) {
            Some(driver) if driver.is_dispatchable() => {
                self.geo.upsert(driver_id.clone(), driver.location());
            }
            _ => self.geo.remove(driver_id),
        }
    }

    // -- Ride request and dispatch ---------------------------------------

    /// Create a ride and try to match a driver immediately.
    ///
    /// The estimate prices the straight-line distance at the configured
    /// assumed speed; the final price is recomputed at completion from
    /// actuals.
    pub fn request_ride(&mut self, request: RideRequest) -> Result<DispatchOutcome, EngineError> {
        if !request.origin.is_valid() {
            return Err(EngineError::InvalidLocation { field: "origin" });
        }
        if !request.destination.is_valid() {
            return Err(EngineError::InvalidLocation { field: "destination" });
        }
        let now = self.clock.now();

        let distance_km = haversine_km(request.origin, request.destination);
        let duration_min = distance_km / self.config.assumed_speed_kmh * 60.0;
        let estimated_price = self.pricing.price(
            request.ride_type,
            distance_km,
            duration_min,
            request.surge_multiplier,
        );

        let ride = Ride::new(
            request.passenger_id,
            request.origin,
            request.origin_address,
            request.destination,
            request.destination_address,
            request.ride_type,
            request.payment_method,
            estimated_price,
            request.surge_multiplier,
            now,
        );
        let ride_id = ride.id().clone();
        self.state.add_ride(ride);
        lifecycle::record_requested(&mut self.state, &ride_id, now);
        tracing::info!(ride = %ride_id, estimated_price, "ride requested");

        match self.matcher.dispatch(
            &mut self.state,
            &self.geo,
            self.eligibility.as_ref(),
            &ride_id,
            now,
        ) {
            Ok(driver_id) => {
                self.sync_driver_geo(&driver_id);
                self.notify_passenger(
                    &ride_id,
                    NotificationEvent::RideAccepted {
                        ride_id: ride_id.clone(),
                        driver_id: driver_id.clone(),
                    },
                );
                Ok(DispatchOutcome::Dispatched {
                    ride_id,
                    driver_id,
                    estimated_price,
                })
            }
            Err(MatchError::NoDriverAvailable { candidates_tried }) => {
                tracing::info!(ride = %ride_id, candidates_tried, "no driver available");
                Ok(DispatchOutcome::NoDriverAvailable {
                    ride_id,
                    estimated_price,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// A driver answers an offer for a ride that is still Requested (for
    /// example after automatic dispatch found nobody). A decline leaves the
    /// ride Requested for other drivers or the staleness sweep.
    pub fn respond_to_ride(
        &mut self,
        ride_id: &RideId,
        driver_id: &DriverId,
        decision: DriverDecision,
    ) -> Result<(), EngineError> {
        match decision {
            DriverDecision::Accept => self.accept_ride(ride_id, driver_id),
            DriverDecision::Decline => {
                // Validate the offer still makes sense before recording the no.
                let ride = self
                    .state
                    .get_ride(ride_id)
                    .ok_or_else(|| RideError::RideNotFound(ride_id.clone()))?;
                if ride.status() != RideStatus::Requested {
                    return Err(RideError::StaleState {
                        expected: RideStatus::Requested,
                        actual: ride.status(),
                    }
                    .into());
                }
                tracing::debug!(ride = %ride_id, driver = %driver_id, "ride declined");
                Ok(())
            }
        }
    }

    /// A driver manually accepts a ride that is still Requested (for
    /// example after automatic dispatch found nobody).
    pub fn accept_ride(
        &mut self,
        ride_id: &RideId,
        driver_id: &DriverId,
    ) -> Result<(), EngineError> {
        let now = self.clock.now();
        lifecycle::accept_ride(&mut self.state, ride_id, driver_id, now)?;
        self.sync_driver_geo(driver_id);
        self.notify_passenger(
            ride_id,
            NotificationEvent::RideAccepted {
                ride_id: ride_id.clone(),
                driver_id: driver_id.clone(),
            },
        );
        Ok(())
    }

    // -- Lifecycle -------------------------------------------------------

    /// Apply a lifecycle trigger on behalf of `actor`.
    ///
    /// Arrive/Start/Complete require the acting driver; Cancel accepts any
    /// permitted party. Completion also runs settlement: a wallet shortfall
    /// is reported in the outcome rather than failing the transition, since
    /// the ride is already Completed by then.
    pub fn transition(
        &mut self,
        ride_id: &RideId,
        trigger: RideTrigger,
        actor: Actor,
    ) -> Result<TransitionOutcome, EngineError> {
        let now = self.clock.now();
        let mut settlement_outcome = None;

        match trigger {
            RideTrigger::Arrive => {
                let driver_id = Self::acting_driver(&actor)?;
                lifecycle::mark_arrived(&mut self.state, ride_id, driver_id, now)?;
                self.notify_passenger(
                    ride_id,
                    NotificationEvent::DriverArrived {
                        ride_id: ride_id.clone(),
                    },
                );
            }
            RideTrigger::Start => {
                let driver_id = Self::acting_driver(&actor)?;
                lifecycle::start_trip(&mut self.state, ride_id, driver_id, now)?;
                self.notify_passenger(
                    ride_id,
                    NotificationEvent::TripStarted {
                        ride_id: ride_id.clone(),
                    },
                );
            }
            RideTrigger::Complete {
                distance_km,
                duration_min,
            } => {
                let driver_id = Self::acting_driver(&actor)?.clone();
                let final_price = lifecycle::complete_trip(
                    &mut self.state,
                    ride_id,
                    &driver_id,
                    distance_km,
                    duration_min,
                    self.pricing.as_ref(),
                    now,
                )?;
                self.sync_driver_geo(&driver_id);
                settlement_outcome = Some(self.settle_after_completion(ride_id, now)?);
                self.notify_passenger(
                    ride_id,
                    NotificationEvent::TripCompleted {
                        ride_id: ride_id.clone(),
                        final_price,
                    },
                );
            }
            RideTrigger::Cancel => {
                let driver_id = {
                    let ride = self
                        .state
                        .get_ride(ride_id)
                        .ok_or_else(|| RideError::RideNotFound(ride_id.clone()))?;
                    ride.driver_id().cloned()
                };
                lifecycle::cancel_ride(&mut self.state, ride_id, actor, now)?;
                if let Some(driver_id) = driver_id {
                    self.sync_driver_geo(&driver_id);
                }
                self.notify_passenger(
                    ride_id,
                    NotificationEvent::RideCancelled {
                        ride_id: ride_id.clone(),
                    },
                );
            }
        }

        let ride = self
            .state
            .get_ride(ride_id)
            .ok_or_else(|| RideError::RideNotFound(ride_id.clone()))?
            .clone();
        Ok(TransitionOutcome {
            ride,
            settlement: settlement_outcome,
        })
    }

    fn acting_driver(actor: &Actor) -> Result<&DriverId, EngineError> {
        match actor {
            Actor::Driver(driver_id) => Ok(driver_id),
            _ => Err(RideError::WrongActor.into()),
        }
    }

    fn settle_after_completion(
        &mut self,
        ride_id: &RideId,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<PostCompletionSettlement, EngineError> {
        match settlement::settle_ride(&mut self.state, ride_id, self.config.fee_rate_bps, now) {
            Ok(SettlementResult::Settled { fare, fee, net }) => {
                Ok(PostCompletionSettlement::Settled { fare, fee, net })
            }
            Ok(SettlementResult::AlreadySettled) => Ok(PostCompletionSettlement::AlreadySettled),
            Ok(SettlementResult::AwaitingDriverConfirmation) => {
                Ok(PostCompletionSettlement::AwaitingDriverConfirmation)
            }
            Err(SettlementError::InsufficientFunds {
                required,
                available,
            }) => Ok(PostCompletionSettlement::InsufficientFunds {
                required,
                available,
            }),
            Err(err) => Err(err.into()),
        }
    }

    // -- Settlement ------------------------------------------------------

    /// Settle a completed ride (retry path; completion settles inline).
    pub fn settle(&mut self, ride_id: &RideId) -> Result<SettlementResult, EngineError> {
        let now = self.clock.now();
        Ok(settlement::settle_ride(
            &mut self.state,
            ride_id,
            self.config.fee_rate_bps,
            now,
        )?)
    }

    /// Driver confirms a cash/card payment was received.
    pub fn confirm_external_payment(
        &mut self,
        ride_id: &RideId,
        driver_id: &DriverId,
        notes: Option<String>,
    ) -> Result<SettlementResult, EngineError> {
        let now = self.clock.now();
        Ok(settlement::confirm_external_payment(
            &mut self.state,
            ride_id,
            driver_id,
            notes,
            now,
        )?)
    }

    // -- Reconciliation --------------------------------------------------

    /// Run the stale-ride sweep. `force == false` is a dry run.
    pub fn sweep_stale(&mut self, force: bool) -> StaleSweepOutcome {
        let now = self.clock.now();
        let outcome = reconciler::sweep_stale(
            &mut self.state,
            now,
            self.config.stale_after_minutes,
            force,
        );
        // Cancelled rides may have freed their drivers.
        let released: Vec<DriverId> = outcome
            .cancelled
            .iter()
            .filter_map(|ride_id| {
                self.state
                    .get_ride(ride_id)
                    .and_then(|r| r.driver_id().cloned())
            })
            .collect();
        for driver_id in released {
            self.sync_driver_geo(&driver_id);
        }
        outcome
    }

    /// Re-run settlement for Completed rides without a Paid payment.
    pub fn repair_settlements(&mut self) -> SweepReport {
        let now = self.clock.now();
        reconciler::repair_settlements(&mut self.state, now, self.config.fee_rate_bps)
    }

    // -- Queries ---------------------------------------------------------

    pub fn get_ride(&self, ride_id: &RideId) -> Option<&Ride> {
        self.state.get_ride(ride_id)
    }

    fn notify_passenger(&self, ride_id: &RideId, event: NotificationEvent) {
        if let Some(ride) = self.state.get_ride(ride_id) {
            self.notifier.notify(ride.passenger_id(), event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::models::ride::RideStatus;

    fn request(passenger: &str) -> RideRequest {
        RideRequest {
            passenger_id: UserId::from(passenger),
            origin: GeoPoint::new(-23.5505, -46.6333),
            origin_address: "Av. Paulista, 1000".to_string(),
            destination: GeoPoint::new(-23.5605, -46.6433),
            destination_address: "Rua Augusta, 500".to_string(),
            ride_type: RideType::Standard,
            payment_method: PaymentMethod::Wallet,
            surge_multiplier: 1.0,
        }
    }

    fn engine_with_manual_clock() -> DispatchEngine {
        DispatchEngine::new(EngineConfig::default())
            .with_clock(Arc::new(ManualClock::default()))
    }

    fn online_driver(engine: &mut DispatchEngine, lat: f64, lon: f64) -> DriverId {
        let id = engine
            .register_driver(
                UserId::new(),
                GeoPoint::new(lat, lon),
                VehicleProfile::default(),
            )
            .unwrap();
        engine.set_driver_online(&id, true).unwrap();
        id
    }

    #[test]
    fn request_dispatches_to_nearby_driver() {
        let mut engine = engine_with_manual_clock();
        let driver_id = online_driver(&mut engine, -23.5510, -46.6330);

        let outcome = engine.request_ride(request("rider")).unwrap();
        match outcome {
            DispatchOutcome::Dispatched {
                driver_id: matched, ..
            } => assert_eq!(matched, driver_id),
            other => panic!("expected dispatch, got {other:?}"),
        }
        // An assigned driver leaves the index.
        assert!(!engine.geo().contains(&driver_id));
    }

    #[test]
    fn request_without_drivers_stays_requested() {
        let mut engine = engine_with_manual_clock();
        let outcome = engine.request_ride(request("rider")).unwrap();
        let ride_id = outcome.ride_id().clone();
        assert!(matches!(outcome, DispatchOutcome::NoDriverAvailable { .. }));
        assert_eq!(
            engine.get_ride(&ride_id).unwrap().status(),
            RideStatus::Requested
        );
    }

    #[test]
    fn invalid_coordinates_are_rejected() {
        let mut engine = engine_with_manual_clock();
        let mut bad = request("rider");
        bad.origin = GeoPoint::new(95.0, 0.0);
        assert!(matches!(
            engine.request_ride(bad),
            Err(EngineError::InvalidLocation { field: "origin" })
        ));
    }

    #[test]
    fn offline_driver_leaves_the_index() {
        let mut engine = engine_with_manual_clock();
        let driver_id = online_driver(&mut engine, 0.0, 0.0);
        assert!(engine.geo().contains(&driver_id));

        engine.set_driver_online(&driver_id, false).unwrap();
        assert!(!engine.geo().contains(&driver_id));
    }

    #[test]
    fn location_ping_moves_the_driver_in_the_index() {
        let mut engine = engine_with_manual_clock();
        let driver_id = online_driver(&mut engine, 0.0, 0.0);

        engine
            .update_driver_location(&driver_id, GeoPoint::new(0.5, 0.5))
            .unwrap();
        let hits = engine.geo().nearby(GeoPoint::new(0.5, 0.5), 5.0, 5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, driver_id);
    }

    #[test]
    fn completion_returns_driver_to_the_index() {
        let mut engine = engine_with_manual_clock();
        engine
            .state_mut()
            .ledger_mut()
            .wallet_or_create(&UserId::from("rider"))
            .credit(100_000);
        let driver_id = online_driver(&mut engine, -23.5510, -46.6330);

        let outcome = engine.request_ride(request("rider")).unwrap();
        let ride_id = outcome.ride_id().clone();
        let actor = Actor::Driver(driver_id.clone());
        engine.transition(&ride_id, RideTrigger::Arrive, actor.clone()).unwrap();
        engine.transition(&ride_id, RideTrigger::Start, actor.clone()).unwrap();
        let done = engine
            .transition(
                &ride_id,
                RideTrigger::Complete {
                    distance_km: 2.0,
                    duration_min: 8.0,
                },
                actor,
            )
            .unwrap();

        assert_eq!(done.ride.status(), RideStatus::Completed);
        assert!(matches!(
            done.settlement,
            Some(PostCompletionSettlement::Settled { .. })
        ));
        assert!(engine.geo().contains(&driver_id));
    }

    #[test]
    fn replayed_completion_settlement_reports_already_settled() {
        let mut engine = engine_with_manual_clock();
        engine
            .state_mut()
            .ledger_mut()
            .wallet_or_create(&UserId::from("rider"))
            .credit(100_000);
        let driver_id = online_driver(&mut engine, -23.5510, -46.6330);
        let outcome = engine.request_ride(request("rider")).unwrap();
        let ride_id = outcome.ride_id().clone();
        let actor = Actor::Driver(driver_id);
        engine.transition(&ride_id, RideTrigger::Arrive, actor.clone()).unwrap();
        engine.transition(&ride_id, RideTrigger::Start, actor.clone()).unwrap();
        engine
            .transition(
                &ride_id,
                RideTrigger::Complete {
                    distance_km: 2.0,
                    duration_min: 8.0,
                },
                actor,
            )
            .unwrap();
        let entries_after_first = engine.state().ledger().entries_for_ride(&ride_id).len();

        // Re-running the post-completion settlement must not invent amounts
        // or touch the ledger again.
        let now = engine.clock.now();
        let replay = engine.settle_after_completion(&ride_id, now).unwrap();
        assert_eq!(replay, PostCompletionSettlement::AlreadySettled);
        assert_eq!(
            engine.state().ledger().entries_for_ride(&ride_id).len(),
            entries_after_first
        );
    }

    #[test]
    fn cancellation_is_reported_to_the_passenger() {
        let notifier = Arc::new(crate::notify::test_support::RecordingNotifier::default());
        let mut engine = DispatchEngine::new(EngineConfig::default())
            .with_clock(Arc::new(ManualClock::default()))
            .with_notifier(notifier.clone());
        online_driver(&mut engine, -23.5510, -46.6330);
        let outcome = engine.request_ride(request("rider")).unwrap();
        let ride_id = outcome.ride_id().clone();

        engine
            .transition(
                &ride_id,
                RideTrigger::Cancel,
                Actor::Passenger(UserId::from("rider")),
            )
            .unwrap();

        let delivered = notifier.delivered.lock().unwrap();
        assert!(matches!(
            delivered.last(),
            Some((_, NotificationEvent::RideCancelled { .. }))
        ));
    }

    #[test]
    fn decline_leaves_the_ride_requested() {
        let mut engine = engine_with_manual_clock();
        let outcome = engine.request_ride(request("rider")).unwrap();
        let ride_id = outcome.ride_id().clone();

        let driver_id = online_driver(&mut engine, -23.5510, -46.6330);
        engine
            .respond_to_ride(&ride_id, &driver_id, DriverDecision::Decline)
            .unwrap();
        assert_eq!(
            engine.get_ride(&ride_id).unwrap().status(),
            RideStatus::Requested
        );

        engine
            .respond_to_ride(&ride_id, &driver_id, DriverDecision::Accept)
            .unwrap();
        assert_eq!(
            engine.get_ride(&ride_id).unwrap().status(),
            RideStatus::Accepted
        );
    }

    #[test]
    fn passenger_cannot_drive_the_trip_forward() {
        let mut engine = engine_with_manual_clock();
        online_driver(&mut engine, -23.5510, -46.6330);
        let outcome = engine.request_ride(request("rider")).unwrap();
        let ride_id = outcome.ride_id().clone();

        let err = engine
            .transition(
                &ride_id,
                RideTrigger::Arrive,
                Actor::Passenger(UserId::from("rider")),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::Ride(RideError::WrongActor)));
    }
}
