use std::collections::HashSet;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::calendar::{parse_date, resolve_active_services};
use crate::dataset::Dataset;
use crate::resolver::{resolve_positions, VehicleStatus};
use crate::state::AppState;

use super::error::GatewayError;
use super::geojson::{collection, linestring_feature, point_feature};

fn dataset_or_not_ready(state: &AppState) -> Result<std::sync::Arc<Dataset>, GatewayError> {
    state.get().ok_or(GatewayError::NotReady)
}

fn is_gtfs_date(s: &str) -> bool {
    s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_iso_datetime(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 19 {
        return false;
    }
    let digit = |i: usize| bytes[i].is_ascii_digit();
    (0..4).all(digit)
        && bytes[4] == b'-'
        && (5..7).all(digit)
        && bytes[7] == b'-'
        && (8..10).all(digit)
        && bytes[10] == b'T'
        && (11..13).all(digit)
        && bytes[13] == b':'
        && (14..16).all(digit)
        && bytes[16] == b':'
        && (17..19).all(digit)
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    #[serde(rename = "shapesLoaded")]
    shapes_loaded: usize,
    #[serde(rename = "stopsLoaded")]
    stops_loaded: usize,
    #[serde(rename = "routesLoaded")]
    routes_loaded: usize,
    #[serde(rename = "tripsLoaded")]
    trips_loaded: usize,
    #[serde(rename = "stopTimesLoaded")]
    stop_times_loaded: usize,
    #[serde(rename = "calendarLoaded")]
    calendar_loaded: usize,
    #[serde(rename = "calendarDatesLoaded")]
    calendar_dates_loaded: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let Some(dataset) = state.get() else {
        return Json(HealthResponse {
            status: "loading",
            shapes_loaded: 0,
            stops_loaded: 0,
            routes_loaded: 0,
            trips_loaded: 0,
            stop_times_loaded: 0,
            calendar_loaded: 0,
            calendar_dates_loaded: 0,
        });
    };

    Json(HealthResponse {
        status: "ready",
        shapes_loaded: dataset.shapes.len(),
        stops_loaded: dataset.stops.len(),
        routes_loaded: dataset.routes.len(),
        trips_loaded: dataset.trips.len(),
        stop_times_loaded: dataset.trips.values().map(|t| t.stop_times.len()).sum(),
        calendar_loaded: dataset.calendars.len(),
        calendar_dates_loaded: dataset.calendar_exceptions.len(),
    })
}

pub async fn shapes_index(State(state): State<AppState>) -> Result<Json<JsonValue>, GatewayError> {
    let dataset = dataset_or_not_ready(&state)?;
    let features = dataset
        .shapes
        .values()
        .map(|shape| {
            let props = json!({ "shape_id": shape.id }).as_object().unwrap().clone();
            linestring_feature(shape, props)
        })
        .collect();
    Ok(Json(serde_json::to_value(collection(features)).unwrap()))
}

pub async fn shapes_show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JsonValue>, GatewayError> {
    let dataset = dataset_or_not_ready(&state)?;
    let shape = dataset
        .shapes
        .get(&id)
        .ok_or_else(|| GatewayError::NotFound(format!("shape '{id}'")))?;
    let props = json!({ "shape_id": shape.id }).as_object().unwrap().clone();
    Ok(Json(serde_json::to_value(linestring_feature(shape, props)).unwrap()))
}

pub async fn stops_index(State(state): State<AppState>) -> Result<Json<JsonValue>, GatewayError> {
    let dataset = dataset_or_not_ready(&state)?;
    let features = dataset
        .stops
        .values()
        .map(|stop| {
            let props = serde_json::to_value(stop).unwrap().as_object().unwrap().clone();
            point_feature(stop.lon, stop.lat, props)
        })
        .collect();
    Ok(Json(serde_json::to_value(collection(features)).unwrap()))
}

pub async fn stops_show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JsonValue>, GatewayError> {
    let dataset = dataset_or_not_ready(&state)?;
    let stop = dataset
        .stops
        .get(&id)
        .ok_or_else(|| GatewayError::NotFound(format!("stop '{id}'")))?;
    let props = serde_json::to_value(stop).unwrap().as_object().unwrap().clone();
    Ok(Json(serde_json::to_value(point_feature(stop.lon, stop.lat, props)).unwrap()))
}

pub async fn routes_index(State(state): State<AppState>) -> Result<Json<JsonValue>, GatewayError> {
    let dataset = dataset_or_not_ready(&state)?;
    let routes: Vec<_> = dataset.routes.values().collect();
    Ok(Json(serde_json::to_value(routes).unwrap()))
}

pub async fn routes_show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JsonValue>, GatewayError> {
    let dataset = dataset_or_not_ready(&state)?;
    let route = dataset
        .routes
        .get(&id)
        .ok_or_else(|| GatewayError::NotFound(format!("route '{id}'")))?;
    Ok(Json(serde_json::to_value(route).unwrap()))
}

pub async fn trips_index(State(state): State<AppState>) -> Result<Json<JsonValue>, GatewayError> {
    let dataset = dataset_or_not_ready(&state)?;
    let trips: Vec<_> = dataset.trips.values().collect();
    Ok(Json(serde_json::to_value(trips).unwrap()))
}

pub async fn trips_show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JsonValue>, GatewayError> {
    let dataset = dataset_or_not_ready(&state)?;
    let trip = dataset
        .trips
        .get(&id)
        .ok_or_else(|| GatewayError::NotFound(format!("trip '{id}'")))?;
    Ok(Json(serde_json::to_value(trip).unwrap()))
}

#[derive(Serialize)]
struct ServicesOnResponse {
    date: String,
    service_count: usize,
    service_ids: Vec<String>,
}

pub async fn services_on(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<ServicesOnResponse>, GatewayError> {
    if !is_gtfs_date(&date) {
        return Err(GatewayError::BadRequest(format!("invalid date '{date}', expected YYYYMMDD")));
    }
    let dataset = dataset_or_not_ready(&state)?;
    let parsed = parse_date(&date)
        .ok_or_else(|| GatewayError::BadRequest(format!("invalid date '{date}'")))?;
    let mut service_ids: Vec<String> = resolve_active_services(&dataset, parsed).into_iter().collect();
    service_ids.sort();
    Ok(Json(ServicesOnResponse {
        service_count: service_ids.len(),
        date,
        service_ids,
    }))
}

#[derive(Serialize)]
struct TripsOnResponse {
    date: String,
    trip_count: usize,
    trip_ids: Vec<String>,
}

pub async fn trips_on(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<TripsOnResponse>, GatewayError> {
    if !is_gtfs_date(&date) {
        return Err(GatewayError::BadRequest(format!("invalid date '{date}', expected YYYYMMDD")));
    }
    let dataset = dataset_or_not_ready(&state)?;
    let parsed = parse_date(&date)
        .ok_or_else(|| GatewayError::BadRequest(format!("invalid date '{date}'")))?;
    let active_services = resolve_active_services(&dataset, parsed);

    let mut trip_ids: Vec<String> = active_services
        .iter()
        .filter_map(|service_id| dataset.trips_by_service.get(service_id))
        .flat_map(|ids| ids.iter().cloned())
        .collect();
    trip_ids.sort();

    Ok(Json(TripsOnResponse {
        trip_count: trip_ids.len(),
        date,
        trip_ids,
    }))
}

#[derive(Deserialize)]
pub struct VehiclesQuery {
    routes: Option<String>,
}

pub async fn vehicles_at(
    State(state): State<AppState>,
    Path(datetime): Path<String>,
    Query(query): Query<VehiclesQuery>,
) -> Result<Json<JsonValue>, GatewayError> {
    if !is_iso_datetime(&datetime) {
        return Err(GatewayError::BadRequest(format!(
            "invalid datetime '{datetime}', expected YYYY-MM-DDTHH:MM:SS"
        )));
    }
    let when = NaiveDateTime::parse_from_str(&datetime, "%Y-%m-%dT%H:%M:%S")
        .map_err(|_| GatewayError::BadRequest(format!("invalid datetime '{datetime}'")))?;

    let dataset = dataset_or_not_ready(&state)?;

    let route_filter: Option<HashSet<String>> = query
        .routes
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| s.split(',').map(|id| id.trim().to_string()).collect());

    let positions = resolve_positions(&dataset, when, route_filter.as_ref());

    let mut vehicles = serde_json::Map::new();
    for (trip_id, position) in &positions {
        let route = dataset
            .trips
            .get(trip_id)
            .and_then(|trip| dataset.trip_route(trip))
            .map(|route| serde_json::to_value(route).unwrap())
            .unwrap_or(JsonValue::Null);

        let mut properties = serde_json::Map::new();
        properties.insert("trip_id".to_string(), json!(trip_id));
        properties.insert("route".to_string(), route);
        properties.insert("shape_dist_traveled".to_string(), json!(position.shape_dist_traveled));

        match &position.status {
            VehicleStatus::AtStop { stop_id, stop_name } => {
                properties.insert("stop_id".to_string(), json!(stop_id));
                properties.insert("stop_name".to_string(), json!(stop_name));
                properties.insert("status".to_string(), json!("at_stop"));
            }
            VehicleStatus::InTransit { from_stop_id, to_stop_id } => {
                properties.insert("from_stop_id".to_string(), json!(from_stop_id));
                properties.insert("to_stop_id".to_string(), json!(to_stop_id));
                properties.insert("status".to_string(), json!("in_transit"));
            }
        }

        let feature = point_feature(position.lon, position.lat, properties);
        vehicles.insert(trip_id.clone(), serde_json::to_value(feature).unwrap());
    }

    Ok(Json(json!({
        "datetime": datetime,
        "vehicle_count": positions.len(),
        "vehicles": vehicles,
    })))
}
