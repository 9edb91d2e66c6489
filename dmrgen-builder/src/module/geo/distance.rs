//! Great-circle distance and grid locators

use dmrgen_common::Coordinates;

/// Mean Earth radius used by every distance computation
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine great-circle distance in kilometres.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let (lat1, lng1) = (a.lat.to_radians(), a.lng.to_radians());
    let (lat2, lng2) = (b.lat.to_radians(), b.lng.to_radians());

    let dlat = lat2 - lat1;
    let dlng = lng2 - lng1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);

    // clamp against rounding pushing h past 1 for antipodal points
    2.0 * h.sqrt().min(1.0).asin() * EARTH_RADIUS_KM
}

/// Arithmetic mean of latitudes and longitudes.
///
/// Returns `None` for an empty slice.
pub fn centroid(points: &[Coordinates]) -> Option<Coordinates> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let lat = points.iter().map(|p| p.lat).sum::<f64>() / n;
    let lng = points.iter().map(|p| p.lng).sum::<f64>() / n;
    Some(Coordinates { lat, lng })
}

/// Six-character Maidenhead locator, e.g. `KO02mf`.
pub fn maidenhead(location: Coordinates) -> String {
    // shift to positive ranges; the north pole and antimeridian fold into the last square
    let lng = (location.lng + 180.0).clamp(0.0, 359.999_999);
    let lat = (location.lat + 90.0).clamp(0.0, 179.999_999);

    let field_lng = (lng / 20.0).floor() as u8;
    let field_lat = (lat / 10.0).floor() as u8;
    let square_lng = ((lng % 20.0) / 2.0).floor() as u8;
    let square_lat = (lat % 10.0).floor() as u8;
    let sub_lng = ((lng % 2.0) * 12.0).floor() as u8;
    let sub_lat = ((lat % 1.0) * 24.0).floor() as u8;

    let mut locator = String::with_capacity(6);
    locator.push((b'A' + field_lng) as char);
    locator.push((b'A' + field_lat) as char);
    locator.push((b'0' + square_lng) as char);
    locator.push((b'0' + square_lat) as char);
    locator.push((b'a' + sub_lng) as char);
    locator.push((b'a' + sub_lat) as char);
    locator
}
