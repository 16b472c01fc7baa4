//! Given a naive datetime, locates every active trip within its stop
//! sequence and interpolates a geographic position.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDateTime, Timelike};
use rayon::prelude::*;

use crate::calendar::resolve_active_services;
use crate::dataset::{Dataset, Trip};

/// Below this many candidate trips, resolve sequentially rather than paying
/// rayon's thread-pool dispatch overhead.
const PARALLEL_THRESHOLD: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum VehicleStatus {
    AtStop { stop_id: String, stop_name: String },
    InTransit { from_stop_id: String, to_stop_id: String },
}

#[derive(Debug, Clone)]
pub struct VehiclePosition {
    pub trip_id: String,
    pub lat: f64,
    pub lon: f64,
    pub shape_dist_traveled: f64,
    pub status: VehicleStatus,
}

/// Resolve the position of every active trip at `when`, optionally
/// restricted to `route_filter` (applied before per-trip work).
pub fn resolve_positions(
    dataset: &Dataset,
    when: NaiveDateTime,
    route_filter: Option<&HashSet<String>>,
) -> HashMap<String, VehiclePosition> {
    let date = when.date();
    let t = when.hour() as i64 * 3600 + when.minute() as i64 * 60 + when.second() as i64;

    let active_services = resolve_active_services(dataset, date);

    let candidate_trips: Vec<&Trip> = active_services
        .iter()
        .filter_map(|service_id| dataset.trips_by_service.get(service_id))
        .flat_map(|trip_ids| trip_ids.iter())
        .filter_map(|trip_id| dataset.trips.get(trip_id))
        .filter(|trip| route_filter.is_none_or(|routes| routes.contains(&trip.route_id)))
        .collect();

    let resolve_one = |trip: &&Trip| resolve_trip_position(dataset, trip, t);

    let positions: Vec<VehiclePosition> = if candidate_trips.len() >= PARALLEL_THRESHOLD {
        candidate_trips.par_iter().filter_map(resolve_one).collect()
    } else {
        candidate_trips.iter().filter_map(resolve_one).collect()
    };

    positions.into_iter().map(|p| (p.trip_id.clone(), p)).collect()
}

fn resolve_trip_position(dataset: &Dataset, trip: &Trip, t: i64) -> Option<VehiclePosition> {
    let stop_times = &trip.stop_times;
    if stop_times.is_empty() {
        return None;
    }

    let t_first = stop_times[0].arrival_seconds;
    let t_last = stop_times[stop_times.len() - 1].departure_seconds;
    if t < t_first || t > t_last {
        return None;
    }

    // At-stop check takes precedence over in-transit.
    for st in stop_times {
        if st.arrival_seconds <= t && t <= st.departure_seconds {
            let stop = dataset.stops.get(&st.stop_id)?;
            return Some(VehiclePosition {
                trip_id: trip.id.clone(),
                lat: stop.lat,
                lon: stop.lon,
                shape_dist_traveled: st.shape_dist,
                status: VehicleStatus::AtStop {
                    stop_id: stop.id.clone(),
                    stop_name: stop.name.clone(),
                },
            });
        }
    }

    for pair in stop_times.windows(2) {
        let (from, to) = (&pair[0], &pair[1]);
        if from.departure_seconds < t && t < to.arrival_seconds {
            let shape = trip.shape_id.as_ref().and_then(|id| dataset.shapes.get(id))?;
            if shape.points.is_empty() {
                return None;
            }

            let span = (to.arrival_seconds - from.departure_seconds) as f64;
            let time_ratio = if span > 0.0 {
                (t - from.departure_seconds) as f64 / span
            } else {
                0.0
            };
            let expected_distance =
                from.shape_dist + time_ratio * (to.shape_dist - from.shape_dist);

            let (lat, lon) = interpolate_along_shape(
                &shape.cumulative_distance,
                &shape.points,
                expected_distance,
            )?;

            return Some(VehiclePosition {
                trip_id: trip.id.clone(),
                lat,
                lon,
                shape_dist_traveled: expected_distance,
                status: VehicleStatus::InTransit {
                    from_stop_id: from.stop_id.clone(),
                    to_stop_id: to.stop_id.clone(),
                },
            });
        }
    }

    None
}

fn interpolate_along_shape(
    cumulative_distance: &[f64],
    points: &[crate::dataset::ShapePoint],
    expected_distance: f64,
) -> Option<(f64, f64)> {
    let j = (0..cumulative_distance.len() - 1)
        .find(|&j| cumulative_distance[j] <= expected_distance && expected_distance <= cumulative_distance[j + 1])?;

    let (d0, d1) = (cumulative_distance[j], cumulative_distance[j + 1]);
    let fraction = if d1 > d0 { (expected_distance - d0) / (d1 - d0) } else { 0.0 };

    let (p0, p1) = (&points[j], &points[j + 1]);
    let lat = p0.lat + fraction * (p1.lat - p0.lat);
    let lon = p0.lon + fraction * (p1.lon - p0.lon);
    Some((lat, lon))
}
