use axum::body::Body;
use axum::http::{Request, StatusCode};
use gtfs_vehicle_positions::dataset::{
    Calendar, Dataset, Route, Shape, ShapePoint, Stop, StopTime, Trip,
};
use gtfs_vehicle_positions::gateway::router;
use gtfs_vehicle_positions::state::AppState;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

fn stop(id: &str, lat: f64, lon: f64) -> Stop {
    Stop {
        id: id.to_string(),
        name: format!("Stop {id}"),
        lat,
        lon,
        code: String::new(),
        desc: String::new(),
        zone_id: String::new(),
        url: String::new(),
        location_type: String::new(),
        parent_station: String::new(),
    }
}

fn trip_with_two_stops(id: &str, route_id: &str, shape_id: Option<&str>) -> Trip {
    Trip {
        id: id.to_string(),
        route_id: route_id.to_string(),
        service_id: "weekday".to_string(),
        shape_id: shape_id.map(str::to_string),
        headsign: String::new(),
        direction: None,
        short_name: String::new(),
        block_id: String::new(),
        wheelchair_accessible: String::new(),
        bikes_allowed: String::new(),
        stop_times: vec![
            StopTime {
                stop_sequence: 1,
                stop_id: "s1".to_string(),
                arrival_seconds: 10 * 3600,
                departure_seconds: 10 * 3600,
                shape_dist: 0.0,
            },
            StopTime {
                stop_sequence: 2,
                stop_id: "s2".to_string(),
                arrival_seconds: 10 * 3600 + 600,
                departure_seconds: 10 * 3600 + 600,
                shape_dist: 111_195.0,
            },
        ],
    }
}

fn fixture_dataset() -> Dataset {
    let mut dataset = Dataset::default();
    dataset.stops.insert("s1".into(), stop("s1", 0.0, 0.0));
    dataset.stops.insert("s2".into(), stop("s2", 0.0, 1.0));

    dataset.routes.insert(
        "ra".into(),
        Route {
            id: "ra".into(),
            short_name: "A".into(),
            long_name: "Route A".into(),
            route_type: 3,
            color: String::new(),
            text_color: String::new(),
            agency_id: String::new(),
            desc: String::new(),
            url: String::new(),
        },
    );
    dataset.routes.insert(
        "rb".into(),
        Route {
            id: "rb".into(),
            short_name: "B".into(),
            long_name: "Route B".into(),
            route_type: 3,
            color: String::new(),
            text_color: String::new(),
            agency_id: String::new(),
            desc: String::new(),
            url: String::new(),
        },
    );

    dataset.shapes.insert(
        "shp1".into(),
        Shape {
            id: "shp1".into(),
            points: vec![
                ShapePoint { lat: 0.0, lon: 0.0 },
                ShapePoint { lat: 0.0, lon: 1.0 },
            ],
            cumulative_distance: vec![0.0, 111_195.0],
        },
    );

    let mut days = [true; 7];
    days[0] = false; // not Sunday, arbitrary "every day but Sunday" calendar
    dataset.calendars.insert(
        "weekday".into(),
        Calendar {
            service_id: "weekday".into(),
            days,
            start_date: "20250101".into(),
            end_date: "20251231".into(),
        },
    );

    let trip_a = trip_with_two_stops("ta", "ra", Some("shp1"));
    let trip_b = trip_with_two_stops("tb", "rb", Some("shp1"));
    dataset.trips.insert("ta".into(), trip_a);
    dataset.trips.insert("tb".into(), trip_b);
    dataset.trips_by_service.insert(
        "weekday".into(),
        vec!["ta".to_string(), "tb".to_string()],
    );

    dataset
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn health_reflects_loaded_counts() {
    let state = AppState::new();
    state.install(fixture_dataset());
    let (status, body) = get(router(state), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["stopsLoaded"], 2);
    assert_eq!(body["tripsLoaded"], 2);
}

#[tokio::test]
async fn services_and_trips_on_date_agree() {
    let state = AppState::new();
    state.install(fixture_dataset());
    let app = router(state);

    let (status, services) = get(app.clone(), "/services/on/20250103").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(services["service_ids"].as_array().unwrap().len(), 1);

    let (status, trips) = get(app, "/trips/on/20250103").await;
    assert_eq!(status, StatusCode::OK);
    let trip_ids: Vec<String> = trips["trip_ids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    assert_eq!(trip_ids, vec!["ta".to_string(), "tb".to_string()]);
}

#[tokio::test]
async fn vehicles_in_transit_interpolates_the_midpoint() {
    let state = AppState::new();
    state.install(fixture_dataset());
    let (status, body) = get(router(state), "/vehicles/at/2025-01-03T10:05:00").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vehicle_count"], 2);

    let vehicle = &body["vehicles"]["ta"];
    assert_eq!(vehicle["properties"]["status"], "in_transit");
    let coords = vehicle["geometry"]["coordinates"].as_array().unwrap();
    assert!((coords[0].as_f64().unwrap() - 0.5).abs() < 1e-3);
}

#[tokio::test]
async fn route_filter_union_matches_combined_query() {
    let state = AppState::new();
    state.install(fixture_dataset());
    let app = router(state);

    let (_, a_only) = get(app.clone(), "/vehicles/at/2025-01-03T10:05:00?routes=ra").await;
    let (_, b_only) = get(app.clone(), "/vehicles/at/2025-01-03T10:05:00?routes=rb").await;
    let (_, both) = get(app, "/vehicles/at/2025-01-03T10:05:00?routes=ra,rb").await;

    let mut union: Vec<String> = a_only["vehicles"]
        .as_object()
        .unwrap()
        .keys()
        .chain(b_only["vehicles"].as_object().unwrap().keys())
        .cloned()
        .collect();
    union.sort();

    let mut combined: Vec<String> = both["vehicles"].as_object().unwrap().keys().cloned().collect();
    combined.sort();

    assert_eq!(union, combined);
}

#[tokio::test]
async fn bad_datetime_shape_is_400() {
    let state = AppState::new();
    state.install(fixture_dataset());
    let (status, body) = get(router(state), "/vehicles/at/not-a-datetime").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn unknown_trip_is_404() {
    let state = AppState::new();
    state.install(fixture_dataset());
    let (status, _) = get(router(state), "/trips/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
