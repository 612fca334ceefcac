//! Geographic index and distance calculations
//!
//! This module provides:
//!
//! - **GeoPoint**: latitude/longitude pair in degrees
//! - **Haversine distance**: great-circle distance on a mean Earth radius of
//!   6371 km
//! - **GeoIndex**: cell-sharded driver locations for "drivers within radius R
//!   of point P" queries
//!
//! The index only holds drivers that are currently dispatchable (online and
//! available); callers maintain membership on every availability or location
//! change, so `nearby` never has to re-check flags.

use crate::models::ids::DriverId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the surface of the Earth, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Both coordinates are finite and within valid ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Great-circle distance between two points via the haversine formula.
///
/// # Example
/// ```
/// use dispatch_core::geo::{haversine_km, GeoPoint};
///
/// let a = GeoPoint::new(-23.5505, -46.6333); // São Paulo
/// let b = GeoPoint::new(-22.9068, -43.1729); // Rio de Janeiro
/// let d = haversine_km(a, b);
/// assert!((d - 360.7).abs() < 5.0);
/// ```
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lon1) = (a.lat.to_radians(), a.lon.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lon.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Kilometers per degree of latitude (and of longitude at the equator).
const KM_PER_DEGREE: f64 = 111.32;

type CellKey = (i32, i32);

/// Spatial index of dispatchable drivers, sharded into lat/lon cells.
///
/// Maintains cell → drivers and driver → cell mappings so a radius query only
/// scans the cells overlapping the search circle instead of every driver.
/// Results are ordered by ascending distance with driver id as a stable
/// tie-break, which keeps dispatch deterministic under equal distances.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeoIndex {
    cell_size_deg: f64,
    drivers_by_cell: HashMap<CellKey, Vec<DriverId>>,
    cell_by_driver: HashMap<DriverId, CellKey>,
    location_by_driver: HashMap<DriverId, GeoPoint>,
}

impl GeoIndex {
    /// Create an index with the given shard size in degrees.
    pub fn new(cell_size_deg: f64) -> Self {
        assert!(
            cell_size_deg.is_finite() && cell_size_deg > 0.0,
            "cell size must be positive"
        );
        Self {
            cell_size_deg,
            drivers_by_cell: HashMap::new(),
            cell_by_driver: HashMap::new(),
            location_by_driver: HashMap::new(),
        }
    }

    fn cell_of(&self, point: GeoPoint) -> CellKey {
        (
            (point.lat / self.cell_size_deg).floor() as i32,
            (point.lon / self.cell_size_deg).floor() as i32,
        )
    }

    /// Number of drivers currently in the index.
    pub fn len(&self) -> usize {
        self.cell_by_driver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_by_driver.is_empty()
    }

    pub fn contains(&self, driver_id: &DriverId) -> bool {
        self.cell_by_driver.contains_key(driver_id)
    }

    /// Insert a driver or move one that is already present.
    pub fn upsert(&mut self, driver_id: DriverId, point: GeoPoint) {
        let new_cell = self.cell_of(point);
        if let Some(old_cell) = self.cell_by_driver.get(&driver_id).copied() {
            if old_cell == new_cell {
                self.location_by_driver.insert(driver_id, point);
                return;
            }
            self.detach_from_cell(&driver_id, old_cell);
        }
        self.drivers_by_cell
            .entry(new_cell)
            .or_default()
            .push(driver_id.clone());
        self.cell_by_driver.insert(driver_id.clone(), new_cell);
        self.location_by_driver.insert(driver_id, point);
    }

    /// Remove a driver from the index. No-op when absent.
    pub fn remove(&mut self, driver_id: &DriverId) {
        if let Some(cell) = self.cell_by_driver.remove(driver_id) {
            self.detach_from_cell(driver_id, cell);
        }
        self.location_by_driver.remove(driver_id);
    }

    fn detach_from_cell(&mut self, driver_id: &DriverId, cell: CellKey) {
        if let Some(ids) = self.drivers_by_cell.get_mut(&cell) {
            ids.retain(|id| id != driver_id);
            if ids.is_empty() {
                self.drivers_by_cell.remove(&cell);
            }
        }
    }

    /// Drivers within `radius_km` of `origin`, nearest first, at most
    /// `limit`. Ties broken by driver id. Read-only.
    ///
    /// The cell scan does not wrap at the ±180° antimeridian: a search
    /// circle straddling it only sees drivers on the origin's side. Fine
    /// for city-scale dispatch away from the date line.
    ///
    /// # Example
    /// ```
    /// use dispatch_core::geo::{GeoIndex, GeoPoint};
    /// use dispatch_core::models::ids::DriverId;
    ///
    /// let mut index = GeoIndex::new(0.01);
    /// index.upsert(DriverId::from("near"), GeoPoint::new(0.001, 0.0));
    /// index.upsert(DriverId::from("far"), GeoPoint::new(0.05, 0.0));
    ///
    /// let hits = index.nearby(GeoPoint::new(0.0, 0.0), 10.0, 5);
    /// assert_eq!(hits[0].0.as_str(), "near");
    /// assert_eq!(hits.len(), 2);
    /// ```
    pub fn nearby(&self, origin: GeoPoint, radius_km: f64, limit: usize) -> Vec<(DriverId, f64)> {
        if limit == 0 || radius_km <= 0.0 || !origin.is_valid() {
            return Vec::new();
        }

        // Bounding box of the search circle, in cells. Longitude degrees
        // shrink with latitude; clamp the cosine away from zero near poles.
        let lat_span_deg = radius_km / KM_PER_DEGREE;
        let cos_lat = origin.lat.to_radians().cos().abs().max(0.01);
        let lon_span_deg = radius_km / (KM_PER_DEGREE * cos_lat);

        let (min_lat_cell, min_lon_cell) =
            self.cell_of(GeoPoint::new(origin.lat - lat_span_deg, origin.lon - lon_span_deg));
        let (max_lat_cell, max_lon_cell) =
            self.cell_of(GeoPoint::new(origin.lat + lat_span_deg, origin.lon + lon_span_deg));

        let mut hits: Vec<(DriverId, f64)> = Vec::new();
        for lat_cell in min_lat_cell..=max_lat_cell {
            for lon_cell in min_lon_cell..=max_lon_cell {
                let Some(ids) = self.drivers_by_cell.get(&(lat_cell, lon_cell)) else {
                    continue;
                };
                for id in ids {
                    let location = self.location_by_driver[id];
                    let distance = haversine_km(origin, location);
                    if distance <= radius_km {
                        hits.push((id.clone(), distance));
                    }
                }
            }
        }

        hits.sort_by(|(a_id, a_d), (b_id, b_d)| {
            a_d.partial_cmp(b_d)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a_id.cmp(b_id))
        });
        hits.truncate(limit);
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> DriverId {
        DriverId::from(s)
    }

    #[test]
    fn haversine_of_identical_points_is_zero() {
        let p = GeoPoint::new(-23.5505, -46.6333);
        assert!(haversine_km(p, p) < 1e-9);
    }

    #[test]
    fn haversine_one_degree_latitude() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(1.0, 0.0);
        let d = haversine_km(a, b);
        assert!((d - 111.19).abs() < 0.5, "got {d}");
    }

    #[test]
    fn nearby_orders_by_distance() {
        let mut index = GeoIndex::new(0.01);
        let origin = GeoPoint::new(-23.5505, -46.6333);
        index.upsert(id("c"), GeoPoint::new(-23.5535, -46.6333));
        index.upsert(id("a"), GeoPoint::new(-23.5510, -46.6333));
        index.upsert(id("b"), GeoPoint::new(-23.5520, -46.6333));

        let hits = index.nearby(origin, 10.0, 5);
        let order: Vec<&str> = hits.iter().map(|(d, _)| d.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert!(hits.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn nearby_breaks_ties_by_driver_id() {
        let mut index = GeoIndex::new(0.01);
        let origin = GeoPoint::new(10.0, 10.0);
        let same_spot = GeoPoint::new(10.001, 10.0);
        index.upsert(id("zeta"), same_spot);
        index.upsert(id("alpha"), same_spot);

        let hits = index.nearby(origin, 5.0, 5);
        assert_eq!(hits[0].0.as_str(), "alpha");
        assert_eq!(hits[1].0.as_str(), "zeta");
    }

    #[test]
    fn nearby_excludes_outside_radius_and_respects_limit() {
        let mut index = GeoIndex::new(0.01);
        let origin = GeoPoint::new(0.0, 0.0);
        index.upsert(id("in1"), GeoPoint::new(0.01, 0.0));
        index.upsert(id("in2"), GeoPoint::new(0.02, 0.0));
        index.upsert(id("out"), GeoPoint::new(1.0, 0.0)); // ~111 km away

        assert_eq!(index.nearby(origin, 10.0, 5).len(), 2);
        assert_eq!(index.nearby(origin, 10.0, 1).len(), 1);
    }

    #[test]
    fn remove_detaches_driver() {
        let mut index = GeoIndex::new(0.01);
        index.upsert(id("d"), GeoPoint::new(0.0, 0.0));
        assert!(index.contains(&id("d")));
        index.remove(&id("d"));
        assert!(!index.contains(&id("d")));
        assert!(index.nearby(GeoPoint::new(0.0, 0.0), 10.0, 5).is_empty());
    }

    #[test]
    fn upsert_moves_driver_across_cells() {
        let mut index = GeoIndex::new(0.01);
        index.upsert(id("d"), GeoPoint::new(0.0, 0.0));
        index.upsert(id("d"), GeoPoint::new(0.5, 0.5));
        assert_eq!(index.len(), 1);
        let hits = index.nearby(GeoPoint::new(0.5, 0.5), 5.0, 5);
        assert_eq!(hits.len(), 1);
    }
}
