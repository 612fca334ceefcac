//! Payment model
//!
//! One payment row per ride, created when the trip completes. The engine
//! guarantees that every Completed ride eventually has a Paid payment; any
//! other combination is a reconciliation target.
//!
//! CRITICAL: All money values are i64 (cents)

use crate::models::ids::RideId;
use crate::models::ride::PaymentMethod;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

/// Payment record for a ride.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    ride_id: RideId,
    status: PaymentStatus,
    method: PaymentMethod,
    /// Amount owed, equal to the ride's final price (cents).
    amount: i64,
    confirmed_by_driver: bool,
    driver_confirmation_time: Option<DateTime<Utc>>,
    driver_notes: Option<String>,
}

impl Payment {
    /// Create a pending payment for a completed ride.
    pub fn pending(ride_id: RideId, method: PaymentMethod, amount: i64) -> Self {
        assert!(amount >= 0, "amount must be non-negative");
        Self {
            ride_id,
            status: PaymentStatus::Pending,
            method,
            amount,
            confirmed_by_driver: false,
            driver_confirmation_time: None,
            driver_notes: None,
        }
    }

    pub fn ride_id(&self) -> &RideId {
        &self.ride_id
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }

    pub fn confirmed_by_driver(&self) -> bool {
        self.confirmed_by_driver
    }

    pub fn driver_confirmation_time(&self) -> Option<DateTime<Utc>> {
        self.driver_confirmation_time
    }

    pub fn driver_notes(&self) -> Option<&str> {
        self.driver_notes.as_deref()
    }

    /// Mark paid with driver confirmation. Settlement calls this exactly
    /// once per ride; the Paid check upstream makes re-invocation a no-op.
    pub(crate) fn mark_paid(&mut self, at: DateTime<Utc>, notes: Option<String>) {
        self.status = PaymentStatus::Paid;
        self.confirmed_by_driver = true;
        self.driver_confirmation_time = Some(at);
        if notes.is_some() {
            self.driver_notes = notes;
        }
    }
}
