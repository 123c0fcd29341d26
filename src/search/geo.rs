use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance in kilometres (haversine).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = lat2 - lat1;
        let dlng = (other.lng - self.lng).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

pub trait Located {
    fn position(&self) -> GeoPoint;
}

/// Records within `radius_km` of `origin`, paired with their distance,
/// in collection order.
pub fn within_radius<'a, R, I>(records: I, origin: GeoPoint, radius_km: f64) -> Vec<(&'a R, f64)>
where
    R: Located + 'a,
    I: IntoIterator<Item = &'a R>,
{
    records
        .into_iter()
        .map(|record| (record, origin.distance_km(&record.position())))
        .filter(|(_, distance)| *distance <= radius_km)
        .collect()
}

/// Reorders `(record, distance)` pairs closest first. Ties keep their order.
pub fn nearest_first<R>(hits: &mut [(&R, f64)]) {
    hits.sort_by(|a, b| a.1.total_cmp(&b.1));
}
