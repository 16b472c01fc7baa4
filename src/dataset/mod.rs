//! The immutable, in-memory GTFS dataset. Built once by [`builder`] and
//! shared read-only thereafter — see the crate root for how it's installed
//! behind a lock and swapped in atomically on load completion.

pub mod builder;
pub mod geometry;

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ShapePoint {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone)]
pub struct Shape {
    pub id: String,
    pub points: Vec<ShapePoint>,
    /// `cumulative_distance[0] == 0.0`, non-decreasing, overrides any
    /// `shape_dist_traveled` the source feed carried.
    pub cumulative_distance: Vec<f64>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub code: String,
    pub desc: String,
    pub zone_id: String,
    pub url: String,
    pub location_type: String,
    pub parent_station: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Route {
    pub id: String,
    pub short_name: String,
    pub long_name: String,
    pub route_type: i32,
    pub color: String,
    pub text_color: String,
    pub agency_id: String,
    pub desc: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct StopTime {
    pub stop_sequence: i64,
    pub stop_id: String,
    pub arrival_seconds: i64,
    pub departure_seconds: i64,
    pub shape_dist: f64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Trip {
    pub id: String,
    pub route_id: String,
    pub service_id: String,
    pub shape_id: Option<String>,
    pub headsign: String,
    pub direction: Option<i32>,
    pub short_name: String,
    pub block_id: String,
    pub wheelchair_accessible: String,
    pub bikes_allowed: String,
    #[serde(skip)]
    pub stop_times: Vec<StopTime>,
}

#[derive(Debug, Clone)]
pub struct Calendar {
    pub service_id: String,
    /// Indexed `Sun=0 .. Sat=6`, matching the source feed's calendar column
    /// order. Fixed, not locale configurable.
    pub days: [bool; 7],
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionKind {
    Add,
    Remove,
}

#[derive(Debug, Clone)]
pub struct CalendarException {
    pub date: String,
    pub service_id: String,
    pub kind: ExceptionKind,
}

/// The fully loaded, read-only dataset. Never mutated after
/// [`builder::DatasetBuilder::build`] returns.
#[derive(Debug, Default)]
pub struct Dataset {
    pub shapes: HashMap<String, Shape>,
    pub stops: HashMap<String, Stop>,
    pub routes: HashMap<String, Route>,
    pub trips: HashMap<String, Trip>,
    pub calendars: HashMap<String, Calendar>,
    pub calendar_exceptions: Vec<CalendarException>,
    /// Exceptions grouped by date for the calendar resolver's per-date scan.
    pub calendar_exceptions_by_date: HashMap<String, Vec<(String, ExceptionKind)>>,
    pub trips_by_service: HashMap<String, Vec<String>>,
}

impl Dataset {
    pub fn trip_route(&self, trip: &Trip) -> Option<&Route> {
        self.routes.get(&trip.route_id)
    }
}
