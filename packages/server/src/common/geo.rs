/// Reject coordinates outside WGS84 ranges (and NaN/inf)
pub fn validate_coordinates(lat: f64, lng: f64) -> Result<(), String> {
    if !lat.is_finite() || !lng.is_finite() {
        return Err("coordinates must be finite numbers".to_string());
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("latitude {} out of range [-90, 90]", lat));
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(format!("longitude {} out of range [-180, 180]", lng));
    }
    Ok(())
}

/// Coarsen coordinates to city-level precision
///
/// Rounds to 2 decimal places ≈ 1km. Used as the memo key for reverse
/// geocoding so nearby pins share one lookup.
///
/// # Example
/// ```
/// use relief_core::common::coarsen_coords;
///
/// let (lat, lng) = coarsen_coords(44.977753, -93.265011);
/// assert_eq!(lat, 44.98);
/// assert_eq!(lng, -93.27);
/// ```
pub fn coarsen_coords(lat: f64, lng: f64) -> (f64, f64) {
    ((lat * 100.0).round() / 100.0, (lng * 100.0).round() / 100.0)
}

/// Calculate distance between two coordinates in kilometers
///
/// Uses Haversine formula for accuracy on Earth's surface
pub fn calculate_distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let dlat = (lat2 - lat1).to_radians();
    let dlng = (lng2 - lng1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlng / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(44.98, -93.27).is_ok());
        assert!(validate_coordinates(90.0, 180.0).is_ok());
        assert!(validate_coordinates(90.1, 0.0).is_err());
        assert!(validate_coordinates(0.0, -180.5).is_err());
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
        assert!(validate_coordinates(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_coarsen_coords() {
        let (lat, lng) = coarsen_coords(-33.8688, 151.2093);
        assert_eq!(lat, -33.87);
        assert_eq!(lng, 151.21);
    }

    #[test]
    fn test_calculate_distance() {
        // Minneapolis to St. Paul (≈16 km)
        let distance = calculate_distance_km(44.98, -93.27, 44.95, -93.09);
        assert!(distance > 13.0 && distance < 17.0);

        assert!(calculate_distance_km(44.98, -93.27, 44.98, -93.27) < 0.1);
    }
}
