//! Fare computation
//!
//! The engine treats pricing as an external collaborator behind the
//! `PricingPolicy` trait; `DistanceTimePricing` is the built-in
//! distance-plus-time tariff.
//!
//! Formula: `fare = (base + km * per_km + min * per_minute) * type_multiplier * surge`
//! rounded to whole cents.

use crate::config::EngineConfig;
use crate::models::ride::RideType;

/// Fare computation seam.
///
/// `surge` is a multiplier supplied by the caller (1.0 = no surge); how it is
/// derived is out of scope here — the policy only applies it.
pub trait PricingPolicy: Send + Sync {
    /// Compute a fare in cents for the given trip parameters.
    fn price(&self, ride_type: RideType, distance_km: f64, duration_min: f64, surge: f64) -> i64;
}

/// Base + per-km + per-minute tariff with per-ride-type multipliers.
#[derive(Debug, Clone)]
pub struct DistanceTimePricing {
    base_fare_cents: i64,
    per_km_cents: i64,
    per_minute_cents: i64,
}

impl DistanceTimePricing {
    pub fn new(base_fare_cents: i64, per_km_cents: i64, per_minute_cents: i64) -> Self {
        Self {
            base_fare_cents,
            per_km_cents,
            per_minute_cents,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.base_fare_cents, config.per_km_cents, config.per_minute_cents)
    }

    fn type_multiplier(ride_type: RideType) -> f64 {
        match ride_type {
            RideType::Standard => 1.0,
            RideType::Executive => 1.5,
            RideType::Armored => 2.0,
            RideType::FemaleOnly => 1.0,
            RideType::PetFriendly => 1.2,
        }
    }
}

impl Default for DistanceTimePricing {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl PricingPolicy for DistanceTimePricing {
    fn price(&self, ride_type: RideType, distance_km: f64, duration_min: f64, surge: f64) -> i64 {
        let distance_km = distance_km.max(0.0);
        let duration_min = duration_min.max(0.0);
        // A bogus multiplier must never zero out or invert a fare.
        let surge = if surge.is_finite() && surge >= 1.0 { surge } else { 1.0 };

        let raw = self.base_fare_cents as f64
            + distance_km * self.per_km_cents as f64
            + duration_min * self.per_minute_cents as f64;
        (raw * Self::type_multiplier(ride_type) * surge).round() as i64
    }
}
