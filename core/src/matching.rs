//! Driver matching
//!
//! Finds a driver for a freshly requested ride: query the geo index for the
//! nearest candidates, filter by ride-type eligibility, then offer the ride
//! to each candidate in distance order until one acceptance sticks. A
//! candidate lost to a concurrent trip (`StaleState`, `DriverUnavailable`)
//! is skipped, not an error; the search only fails when every candidate
//! within the radius and attempt budget has been tried.

use crate::config::EngineConfig;
use crate::geo::GeoIndex;
use crate::lifecycle;
use crate::models::driver::{Driver, VehicleProfile};
use crate::models::ids::{DriverId, RideId};
use crate::models::ride::{RideError, RideType};
use crate::models::state::DispatchState;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors from dispatch matching.
#[derive(Debug, Error, PartialEq)]
pub enum MatchError {
    /// Every eligible candidate within the search radius was tried.
    #[error("no driver available ({candidates_tried} candidates tried)")]
    NoDriverAvailable { candidates_tried: usize },

    #[error(transparent)]
    Ride(#[from] RideError),
}

/// Decides whether a driver may serve a given ride type.
pub trait RideTypeEligibility: Send + Sync {
    fn is_eligible(&self, driver: &Driver, ride_type: RideType) -> bool;
}

/// Eligibility from the driver's vehicle profile. Standard rides accept any
/// vehicle; every other type requires its matching attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct VehicleEligibility;

impl RideTypeEligibility for VehicleEligibility {
    fn is_eligible(&self, driver: &Driver, ride_type: RideType) -> bool {
        let profile: &VehicleProfile = driver.profile();
        match ride_type {
            RideType::Standard => true,
            RideType::Executive => profile.executive,
            RideType::Armored => profile.armored,
            RideType::FemaleOnly => profile.female_driver,
            RideType::PetFriendly => profile.accepts_pets,
        }
    }
}

/// Nearest-first dispatch over the geo index.
#[derive(Debug, Clone)]
pub struct DispatchMatcher {
    radius_km: f64,
    candidate_limit: usize,
    max_attempts: usize,
}

impl DispatchMatcher {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            radius_km: config.dispatch_radius_km,
            candidate_limit: config.dispatch_candidate_limit,
            max_attempts: config.dispatch_max_attempts,
        }
    }

    /// Try to assign a driver to `ride_id`.
    ///
    /// Returns the id of the driver who accepted. Candidates are offered in
    /// distance order (driver id breaks ties); ineligible drivers are
    /// filtered before the offer, and races lost at acceptance time move on
    /// to the next candidate.
    pub fn dispatch(
        &self,
        state: &mut DispatchState,
        geo: &GeoIndex,
        eligibility: &dyn RideTypeEligibility,
        ride_id: &RideId,
        now: DateTime<Utc>,
    ) -> Result<DriverId, MatchError> {
        let (origin, ride_type) = {
            let ride = state
                .get_ride(ride_id)
                .ok_or_else(|| RideError::RideNotFound(ride_id.clone()))?;
            (ride.origin(), ride.ride_type())
        };

        let candidates = geo.nearby(origin, self.radius_km, self.candidate_limit);
        let mut tried = 0usize;
        for (driver_id, distance_km) in candidates {
            if tried >= self.max_attempts {
                break;
            }
            let eligible = state
                .get_driver(&driver_id)
                .is_some_and(|d| eligibility.is_eligible(d, ride_type));
            if !eligible {
                continue;
            }
            tried += 1;
            match lifecycle::accept_ride(state, ride_id, &driver_id, now) {
                Ok(()) => {
                    tracing::debug!(
                        ride = %ride_id,
                        driver = %driver_id,
                        distance_km,
                        "matched driver"
                    );
                    return Ok(driver_id);
                }
                // Lost the driver to a concurrent assignment; next candidate.
                Err(RideError::DriverUnavailable(_)) => continue,
                Err(RideError::DriverNotFound(_)) => continue,
                // The ride itself moved on (another match, a cancel).
                Err(err @ RideError::StaleState { .. }) => return Err(err.into()),
                Err(err) => return Err(err.into()),
            }
        }
        Err(MatchError::NoDriverAvailable {
            candidates_tried: tried,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use crate::models::ids::UserId;
    use crate::models::ride::{PaymentMethod, Ride, RideStatus};

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    fn add_driver(
        state: &mut DispatchState,
        geo: &mut GeoIndex,
        lat: f64,
        lon: f64,
        profile: VehicleProfile,
    ) -> DriverId {
        let mut driver = Driver::new(UserId::new(), GeoPoint::new(lat, lon), profile);
        driver.set_online(true);
        let id = driver.id().clone();
        geo.upsert(id.clone(), driver.location());
        state.add_driver(driver);
        id
    }

    fn add_ride(state: &mut DispatchState, ride_type: RideType) -> RideId {
        let ride = Ride::new(
            UserId::from("rider"),
            GeoPoint::new(0.0, 0.0),
            "A".to_string(),
            GeoPoint::new(0.2, 0.2),
            "B".to_string(),
            ride_type,
            PaymentMethod::Wallet,
            1_500,
            1.0,
            Utc::now(),
        );
        let id = ride.id().clone();
        state.add_ride(ride);
        id
    }

    #[test]
    fn nearest_eligible_driver_wins() {
        let mut state = DispatchState::new();
        let mut geo = GeoIndex::new(config().geo_cell_size_deg);
        let near = add_driver(&mut state, &mut geo, 0.001, 0.001, VehicleProfile::default());
        let _far = add_driver(&mut state, &mut geo, 0.05, 0.05, VehicleProfile::default());
        let ride_id = add_ride(&mut state, RideType::Standard);

        let matcher = DispatchMatcher::new(&config());
        let matched = matcher
            .dispatch(&mut state, &geo, &VehicleEligibility, &ride_id, Utc::now())
            .unwrap();
        assert_eq!(matched, near);
        assert_eq!(state.get_ride(&ride_id).unwrap().status(), RideStatus::Accepted);
    }

    #[test]
    fn ineligible_drivers_are_skipped() {
        let mut state = DispatchState::new();
        let mut geo = GeoIndex::new(config().geo_cell_size_deg);
        // Nearest driver has no executive vehicle.
        let _plain = add_driver(&mut state, &mut geo, 0.001, 0.001, VehicleProfile::default());
        let exec = add_driver(
            &mut state,
            &mut geo,
            0.01,
            0.01,
            VehicleProfile {
                executive: true,
                ..VehicleProfile::default()
            },
        );
        let ride_id = add_ride(&mut state, RideType::Executive);

        let matcher = DispatchMatcher::new(&config());
        let matched = matcher
            .dispatch(&mut state, &geo, &VehicleEligibility, &ride_id, Utc::now())
            .unwrap();
        assert_eq!(matched, exec);
    }

    #[test]
    fn busy_candidate_falls_through_to_next() {
        let mut state = DispatchState::new();
        let mut geo = GeoIndex::new(config().geo_cell_size_deg);
        let busy = add_driver(&mut state, &mut geo, 0.001, 0.001, VehicleProfile::default());
        let free = add_driver(&mut state, &mut geo, 0.01, 0.01, VehicleProfile::default());
        // The nearest driver grabbed another trip after the index snapshot.
        state.get_driver_mut(&busy).unwrap().hold_for_trip();
        let ride_id = add_ride(&mut state, RideType::Standard);

        let matcher = DispatchMatcher::new(&config());
        let matched = matcher
            .dispatch(&mut state, &geo, &VehicleEligibility, &ride_id, Utc::now())
            .unwrap();
        assert_eq!(matched, free);
    }

    #[test]
    fn empty_radius_reports_no_driver() {
        let mut state = DispatchState::new();
        let geo = GeoIndex::new(config().geo_cell_size_deg);
        let ride_id = add_ride(&mut state, RideType::Standard);

        let matcher = DispatchMatcher::new(&config());
        let err = matcher
            .dispatch(&mut state, &geo, &VehicleEligibility, &ride_id, Utc::now())
            .unwrap_err();
        assert_eq!(err, MatchError::NoDriverAvailable { candidates_tried: 0 });
    }

    #[test]
    fn drivers_outside_radius_are_not_offered() {
        let mut state = DispatchState::new();
        let mut geo = GeoIndex::new(config().geo_cell_size_deg);
        // ~1 degree of latitude is ~111 km, far beyond the 10 km radius.
        let _far = add_driver(&mut state, &mut geo, 1.0, 1.0, VehicleProfile::default());
        let ride_id = add_ride(&mut state, RideType::Standard);

        let matcher = DispatchMatcher::new(&config());
        let err = matcher
            .dispatch(&mut state, &geo, &VehicleEligibility, &ride_id, Utc::now())
            .unwrap_err();
        assert_eq!(err, MatchError::NoDriverAvailable { candidates_tried: 0 });
    }

    #[test]
    fn attempt_budget_bounds_the_search() {
        let mut state = DispatchState::new();
        let mut geo = GeoIndex::new(config().geo_cell_size_deg);
        // Three busy drivers closer than the one free driver.
        for i in 0..3 {
            let id = add_driver(
                &mut state,
                &mut geo,
                0.001 * (i + 1) as f64,
                0.0,
                VehicleProfile::default(),
            );
            state.get_driver_mut(&id).unwrap().hold_for_trip();
        }
        let _free = add_driver(&mut state, &mut geo, 0.02, 0.0, VehicleProfile::default());
        let ride_id = add_ride(&mut state, RideType::Standard);

        let mut cfg = config();
        cfg.dispatch_max_attempts = 3;
        let matcher = DispatchMatcher::new(&cfg);
        let err = matcher
            .dispatch(&mut state, &geo, &VehicleEligibility, &ride_id, Utc::now())
            .unwrap_err();
        assert_eq!(err, MatchError::NoDriverAvailable { candidates_tried: 3 });
    }
}
