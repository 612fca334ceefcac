//! Dispatch state
//!
//! The repository boundary of the engine: all drivers, rides, payments, the
//! wallet ledger, and the status history live here, behind typed accessors.
//! Components receive `&DispatchState` / `&mut DispatchState` — there are no
//! process-wide registries.
//!
//! Every mutating operation in the crate is validate-then-apply against this
//! state, so a failed operation never leaves partial writes behind.

use crate::models::driver::Driver;
use crate::models::event::EventLog;
use crate::models::ids::{DriverId, RideId};
use crate::models::ledger::Ledger;
use crate::models::payment::Payment;
use crate::models::ride::Ride;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// In-memory state of the dispatch engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchState {
    drivers: HashMap<DriverId, Driver>,
    rides: HashMap<RideId, Ride>,
    /// Keyed by ride: exactly one payment per completed ride.
    payments: HashMap<RideId, Payment>,
    ledger: Ledger,
    history: EventLog,
}

impl DispatchState {
    pub fn new() -> Self {
        Self::default()
    }

    // Drivers ------------------------------------------------------------

    pub fn get_driver(&self, id: &DriverId) -> Option<&Driver> {
        self.drivers.get(id)
    }

    pub fn get_driver_mut(&mut self, id: &DriverId) -> Option<&mut Driver> {
        self.drivers.get_mut(id)
    }

    pub fn add_driver(&mut self, driver: Driver) {
        self.drivers.insert(driver.id().clone(), driver);
    }

    pub fn drivers(&self) -> &HashMap<DriverId, Driver> {
        &self.drivers
    }

    pub fn num_drivers(&self) -> usize {
        self.drivers.len()
    }

    // Rides --------------------------------------------------------------

    pub fn get_ride(&self, id: &RideId) -> Option<&Ride> {
        self.rides.get(id)
    }

    pub fn get_ride_mut(&mut self, id: &RideId) -> Option<&mut Ride> {
        self.rides.get_mut(id)
    }

    pub fn add_ride(&mut self, ride: Ride) {
        self.rides.insert(ride.id().clone(), ride);
    }

    pub fn rides(&self) -> &HashMap<RideId, Ride> {
        &self.rides
    }

    pub fn num_rides(&self) -> usize {
        self.rides.len()
    }

    // Payments -----------------------------------------------------------

    pub fn get_payment(&self, ride_id: &RideId) -> Option<&Payment> {
        self.payments.get(ride_id)
    }

    pub fn get_payment_mut(&mut self, ride_id: &RideId) -> Option<&mut Payment> {
        self.payments.get_mut(ride_id)
    }

    pub fn add_payment(&mut self, payment: Payment) {
        self.payments.insert(payment.ride_id().clone(), payment);
    }

    /// Remove the payment stub of an abandoned ride. Reconciler cleanup only.
    pub(crate) fn remove_payment(&mut self, ride_id: &RideId) -> Option<Payment> {
        self.payments.remove(ride_id)
    }

    // Ledger & history ---------------------------------------------------

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    pub fn history(&self) -> &EventLog {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut EventLog {
        &mut self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use crate::models::driver::VehicleProfile;
    use crate::models::ids::UserId;

    #[test]
    fn driver_round_trip() {
        let mut state = DispatchState::new();
        let driver = Driver::new(
            UserId::from("u1"),
            GeoPoint::new(0.0, 0.0),
            VehicleProfile::default(),
        );
        let id = driver.id().clone();
        state.add_driver(driver);

        assert!(state.get_driver(&id).is_some());
        assert_eq!(state.num_drivers(), 1);
        state.get_driver_mut(&id).unwrap().set_online(true);
        assert!(state.get_driver(&id).unwrap().is_online());
    }
}
