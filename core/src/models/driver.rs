//! Driver model
//!
//! Tracks the three flags the engine keeps consistent with ride state:
//! `is_online` (driver opened the app), `is_available` (dispatchable) and
//! `is_active_trip` (currently holds a non-terminal ride). The invariant is
//! `is_active_trip && !is_available` exactly while the driver's ride is in
//! {Accepted, Arrived, InProgress}; a driver holds at most one such ride.

use crate::geo::GeoPoint;
use crate::models::ids::{DriverId, UserId};
use serde::{Deserialize, Serialize};

/// Vehicle and driver attributes checked by ride-type eligibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleProfile {
    pub executive: bool,
    pub armored: bool,
    pub female_driver: bool,
    pub accepts_pets: bool,
}

/// A driver participating in dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    id: DriverId,
    user_id: UserId,
    is_online: bool,
    is_available: bool,
    is_active_trip: bool,
    location: GeoPoint,
    profile: VehicleProfile,
}

impl Driver {
    /// Create a driver, initially offline.
    pub fn new(user_id: UserId, location: GeoPoint, profile: VehicleProfile) -> Self {
        Self {
            id: DriverId::new(),
            user_id,
            is_online: false,
            is_available: false,
            is_active_trip: false,
            location,
            profile,
        }
    }

    pub fn id(&self) -> &DriverId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn is_online(&self) -> bool {
        self.is_online
    }

    pub fn is_available(&self) -> bool {
        self.is_available
    }

    pub fn is_active_trip(&self) -> bool {
        self.is_active_trip
    }

    /// Online, available, and not on a trip.
    pub fn is_dispatchable(&self) -> bool {
        self.is_online && self.is_available && !self.is_active_trip
    }

    pub fn location(&self) -> GeoPoint {
        self.location
    }

    pub fn profile(&self) -> &VehicleProfile {
        &self.profile
    }

    /// Go online (becomes available unless mid-trip) or offline.
    pub fn set_online(&mut self, online: bool) {
        self.is_online = online;
        if online {
            self.is_available = !self.is_active_trip;
        } else {
            self.is_available = false;
        }
    }

    pub fn set_location(&mut self, location: GeoPoint) {
        self.location = location;
    }

    /// Claim the driver for a ride: unavailable until released.
    pub(crate) fn hold_for_trip(&mut self) {
        self.is_available = false;
        self.is_active_trip = true;
    }

    /// Release the driver when their ride reaches a terminal state.
    /// Availability comes back only if they are still online.
    pub(crate) fn release_from_trip(&mut self) {
        self.is_active_trip = false;
        self.is_available = self.is_online;
    }
}
