//! Haversine distance and the shape/stop-distance derivations built on it.

const EARTH_RADIUS_M: f64 = 6_371_000.0;

pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Cumulative great-circle distance along an ordered sequence of points.
/// `cumulative[0] == 0.0` and the sequence is non-decreasing by construction.
pub fn cumulative_distances(points: &[(f64, f64)]) -> Vec<f64> {
    let mut out = Vec::with_capacity(points.len());
    let mut running = 0.0;
    for (i, &(lat, lon)) in points.iter().enumerate() {
        if i > 0 {
            let (plat, plon) = points[i - 1];
            running += haversine_m(plat, plon, lat, lon);
        }
        out.push(running);
    }
    out
}

/// Index of the shape point geographically closest to (lat, lon), breaking
/// ties at the lowest index. `None` if `points` is empty.
pub fn nearest_point_index(points: &[(f64, f64)], lat: f64, lon: f64) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .map(|(i, &(plat, plon))| (i, haversine_m(plat, plon, lat, lon)))
        .min_by(|(ia, da), (ib, db)| {
            da.partial_cmp(db)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(ia.cmp(ib))
        })
        .map(|(i, _)| i)
}
