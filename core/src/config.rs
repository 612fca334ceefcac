//! Engine configuration
//!
//! Single source of truth for the knobs that were historically hard-coded in
//! several places: the platform fee rate, the staleness threshold used by the
//! reconciler, and the dispatch search parameters.
//!
//! CRITICAL: All money values are i64 (cents); rates are i64 basis points.

use serde::{Deserialize, Serialize};

/// Configuration for the dispatch engine.
///
/// # Example
/// ```
/// use dispatch_core::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.fee_rate_bps, 1000); // 10%
/// assert_eq!(config.stale_after_minutes, 30);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Platform fee retained from each fare, in basis points (1000 = 10%).
    pub fee_rate_bps: i64,

    /// Age in minutes after which a ride stuck in Requested/Accepted becomes
    /// a reconciliation candidate.
    pub stale_after_minutes: i64,

    /// Search radius around the pickup point when matching, in kilometers.
    pub dispatch_radius_km: f64,

    /// Maximum number of nearby candidates fetched per dispatch.
    pub dispatch_candidate_limit: usize,

    /// Maximum candidates actually tried before reporting NoDriverAvailable.
    /// Bounds the retry loop when accepts are lost to races.
    pub dispatch_max_attempts: usize,

    /// Shard granularity of the geo index, in degrees of latitude/longitude.
    pub geo_cell_size_deg: f64,

    /// Flag-drop fare component (cents).
    pub base_fare_cents: i64,

    /// Per-kilometer fare component (cents).
    pub per_km_cents: i64,

    /// Per-minute fare component (cents).
    pub per_minute_cents: i64,

    /// Assumed average speed used to estimate trip duration at request time
    /// (km/h). Only feeds the estimated price, never the final one.
    pub assumed_speed_kmh: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fee_rate_bps: 1000,
            stale_after_minutes: 30,
            dispatch_radius_km: 10.0,
            dispatch_candidate_limit: 5,
            dispatch_max_attempts: 3,
            geo_cell_size_deg: 0.01,
            base_fare_cents: 250,
            per_km_cents: 150,
            per_minute_cents: 40,
            assumed_speed_kmh: 30.0,
        }
    }
}

impl EngineConfig {
    /// Platform fee for a given fare: `fare * fee_rate_bps / 10_000`,
    /// integer division (fractions of a cent stay with the driver).
    ///
    /// # Example
    /// ```
    /// use dispatch_core::EngineConfig;
    ///
    /// let config = EngineConfig::default();
    /// assert_eq!(config.platform_fee(10_000), 1_000); // 10% of $100.00
    /// ```
    pub fn platform_fee(&self, fare: i64) -> i64 {
        fare * self.fee_rate_bps / 10_000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fee_is_ten_percent() {
        let config = EngineConfig::default();
        assert_eq!(config.platform_fee(10_000), 1_000);
        assert_eq!(config.platform_fee(0), 0);
    }

    #[test]
    fn fee_rounds_down() {
        let config = EngineConfig { fee_rate_bps: 1000, ..Default::default() };
        // 10% of 99 cents is 9.9 cents; the fraction stays with the driver.
        assert_eq!(config.platform_fee(99), 9);
    }

    #[test]
    fn config_serializes() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).expect("serialize");
        let back: EngineConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.fee_rate_bps, config.fee_rate_bps);
        assert_eq!(back.stale_after_minutes, config.stale_after_minutes);
    }
}
