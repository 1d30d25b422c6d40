//! Great-circle distance helpers.

use crate::models::UserLocation;

const EARTH_RADIUS_KM: f64 = 6371.0;
const MILES_PER_KM: f64 = 0.621371;

/// Haversine distance in kilometers from `from` to the target coordinate.
///
/// Returns `f64::INFINITY` when either target coordinate is missing so that
/// unlocated shelters sort last.
pub fn haversine_km(from: UserLocation, lat: Option<f64>, lon: Option<f64>) -> f64 {
    let (Some(lat2), Some(lon2)) = (lat, lon) else {
        return f64::INFINITY;
    };

    let d_lat = (lat2 - from.lat).to_radians();
    let d_lon = (lon2 - from.lon).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

pub fn km_to_miles(km: f64) -> f64 {
    km * MILES_PER_KM
}

/// Miles with one decimal, e.g. `"7.7"`.
pub fn format_miles(km: f64) -> String {
    format!("{:.1}", km_to_miles(km))
}
