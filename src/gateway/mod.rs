//! Translates inbound requests into resolver calls and encodes results as
//! JSON/GeoJSON. Never retries, never caches.

pub mod error;
mod geojson;
mod handlers;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/shapes", get(handlers::shapes_index))
        .route("/shapes/{id}", get(handlers::shapes_show))
        .route("/stops", get(handlers::stops_index))
        .route("/stops/{id}", get(handlers::stops_show))
        .route("/routes", get(handlers::routes_index))
        .route("/routes/{id}", get(handlers::routes_show))
        .route("/trips", get(handlers::trips_index))
        .route("/trips/{id}", get(handlers::trips_show))
        .route("/services/on/{date}", get(handlers::services_on))
        .route("/trips/on/{date}", get(handlers::trips_on))
        .route("/vehicles/at/{datetime}", get(handlers::vehicles_at))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_reports_not_ready_before_load() {
        let app = router(AppState::new());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_date_shape_is_rejected() {
        let app = router(AppState::new());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/services/on/not-a-date")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn vehicles_at_before_load_is_not_ready() {
        let app = router(AppState::new());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/vehicles/at/2025-01-03T09:00:15")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn unknown_shape_id_is_404() {
        let state = AppState::new();
        state.install(crate::dataset::Dataset::default());
        let app = router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/shapes/does-not-exist")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
