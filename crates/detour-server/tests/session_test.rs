//! Planning session integration tests against a mock OSRM server.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use detour_core::{Coordinate, CyclePhase, RouteErrorKind};
use detour_providers::{AnyProvider, OsrmClient, TomTomClient};
use detour_server::config::Config;
use detour_server::session::SessionInputs;
use detour_server::state::AppState;
use serde_json::json;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const MODE_OK: u8 = 0;
const MODE_NO_ROUTE: u8 = 1;
const MODE_SLOW: u8 = 2;

#[derive(Default)]
struct MockOsrm {
    mode: AtomicU8,
    calls: AtomicUsize,
}

async fn osrm_route(
    State(mock): State<Arc<MockOsrm>>,
    Path((_profile, coords)): Path<(String, String)>,
) -> impl IntoResponse {
    mock.calls.fetch_add(1, Ordering::SeqCst);
    match mock.mode.load(Ordering::SeqCst) {
        MODE_NO_ROUTE => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "code": "NoRoute", "message": "Impossible route between points" })),
            )
        }
        MODE_SLOW => tokio::time::sleep(Duration::from_millis(400)).await,
        _ => {}
    }
    let waypoints: Vec<[f64; 2]> = coords
        .split(';')
        .filter_map(|pair| {
            let (lng, lat) = pair.split_once(',')?;
            Some([lng.parse().ok()?, lat.parse().ok()?])
        })
        .collect();
    let mut coordinates = vec![waypoints[0]];
    for leg in waypoints.windows(2) {
        for i in 1..=10 {
            let t = i as f64 / 10.0;
            coordinates.push([
                leg[0][0] + (leg[1][0] - leg[0][0]) * t,
                leg[0][1] + (leg[1][1] - leg[0][1]) * t,
            ]);
        }
    }
    (
        StatusCode::OK,
        Json(json!({
            "code": "Ok",
            "routes": [{
                "geometry": { "type": "LineString", "coordinates": coordinates },
                "distance": 3000.0,
                "duration": 400.0
            }]
        })),
    )
}

async fn spawn_mock() -> (String, Arc<MockOsrm>) {
    let mock = Arc::new(MockOsrm::default());
    let app = Router::new()
        .route("/route/v1/:profile/:coords", get(osrm_route))
        .with_state(mock.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), mock)
}

async fn setup(debounce: Duration) -> (Arc<AppState>, Arc<MockOsrm>) {
    let (base, mock) = spawn_mock().await;
    let config = Config {
        planning_debounce: debounce,
        ..Config::default()
    };
    let client = OsrmClient::new(base, "driving", Duration::from_secs(5)).unwrap();
    let state = Arc::new(AppState::with_provider(config, AnyProvider::Osrm(client)));
    // Keep hazards out of the way unless a test adds them.
    state.replace_hazards(Vec::new()).unwrap();
    (state, mock)
}

fn inputs(dest_lng: f64) -> SessionInputs {
    SessionInputs {
        source: Coordinate::new(19.0000, 72.8000),
        destination: Coordinate::new(19.0000, dest_lng),
        avoid_hazards: true,
    }
}

#[tokio::test]
async fn rapid_updates_are_debounced_and_last_write_wins() {
    let (state, mock) = setup(Duration::from_millis(150)).await;
    let session = state.create_session(inputs(72.81)).unwrap();
    for lng in [72.82, 72.83, 72.84, 72.85] {
        state.update_session(session.id(), inputs(lng)).unwrap();
    }

    assert!(session.wait_settled(Duration::from_secs(5)).await);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.generation, 5);
    assert_eq!(snapshot.phase, CyclePhase::Done);
    let route = snapshot.route.unwrap();
    assert!(route.polyline.end().approx_eq(&Coordinate::new(19.0, 72.85), 1e-9));
    // Only the last cycle outlived its debounce.
    assert_eq!(mock.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn superseded_slow_cycle_never_lands() {
    let (state, mock) = setup(Duration::ZERO).await;
    mock.mode.store(MODE_SLOW, Ordering::SeqCst);
    let session = state.create_session(inputs(72.81)).unwrap();

    // Let the first request reach the provider, then supersede it.
    tokio::time::sleep(Duration::from_millis(100)).await;
    mock.mode.store(MODE_OK, Ordering::SeqCst);
    state.update_session(session.id(), inputs(72.86)).unwrap();

    assert!(session.wait_settled(Duration::from_secs(5)).await);
    tokio::time::sleep(Duration::from_millis(500)).await;

    let snapshot = session.snapshot();
    assert_eq!(snapshot.generation, 2);
    let route = snapshot.route.unwrap();
    assert!(route.polyline.end().approx_eq(&Coordinate::new(19.0, 72.86), 1e-9));
}

#[tokio::test]
async fn no_route_keeps_last_good_route() {
    let (state, mock) = setup(Duration::ZERO).await;
    let session = state.create_session(inputs(72.81)).unwrap();
    assert!(session.wait_settled(Duration::from_secs(5)).await);
    let good = session.snapshot().route.unwrap();

    mock.mode.store(MODE_NO_ROUTE, Ordering::SeqCst);
    state.update_session(session.id(), inputs(72.90)).unwrap();
    assert!(session.wait_settled(Duration::from_secs(5)).await);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, CyclePhase::Error);
    let error = snapshot.error.unwrap();
    assert_eq!(error.kind, RouteErrorKind::NoRoute);
    let kept = snapshot.route.unwrap();
    assert!(kept.polyline.approx_eq(&good.polyline, 1e-12));
    assert!(kept.polyline.end().approx_eq(&Coordinate::new(19.0, 72.81), 1e-9));

    // Recovery replaces the kept route and clears the error.
    mock.mode.store(MODE_OK, Ordering::SeqCst);
    state.update_session(session.id(), inputs(72.90)).unwrap();
    assert!(session.wait_settled(Duration::from_secs(5)).await);
    let snapshot = session.snapshot();
    assert!(snapshot.error.is_none());
    assert!(snapshot
        .route
        .unwrap()
        .polyline
        .end()
        .approx_eq(&Coordinate::new(19.0, 72.90), 1e-9));
}

#[tokio::test]
async fn hazard_update_triggers_detour() {
    let (state, mock) = setup(Duration::ZERO).await;
    let session = state.create_session(inputs(72.83)).unwrap();
    assert!(session.wait_settled(Duration::from_secs(5)).await);
    assert!(!session.snapshot().route.unwrap().rerouted);
    assert_eq!(mock.calls.load(Ordering::SeqCst), 1);

    let zone = detour_core::HazardZone::new(
        "midpoint",
        Coordinate::new(19.0, 72.815),
        400.0,
        "Blocked",
        detour_core::HazardSeverity::High,
    )
    .unwrap();
    assert_eq!(state.replace_hazards(vec![zone]).unwrap(), 1);
    assert!(session.wait_settled(Duration::from_secs(5)).await);

    let route = session.snapshot().route.unwrap();
    assert!(route.rerouted);
    assert_eq!(route.detour_waypoints.len(), 5);
    // Initial route plus one detour request for the new cycle.
    assert_eq!(mock.calls.load(Ordering::SeqCst), 3);
}

async fn tomtom_route(
    State(mock): State<Arc<MockOsrm>>,
    Path(locations): Path<String>,
) -> Json<serde_json::Value> {
    mock.calls.fetch_add(1, Ordering::SeqCst);
    if mock.mode.load(Ordering::SeqCst) == MODE_NO_ROUTE {
        return Json(json!({ "routes": [] }));
    }
    let points: Vec<serde_json::Value> = locations
        .split(':')
        .filter_map(|pair| {
            let (lat, lng) = pair.split_once(',')?;
            Some(json!({ "latitude": lat.parse::<f64>().ok()?, "longitude": lng.parse::<f64>().ok()? }))
        })
        .collect();
    Json(json!({
        "routes": [{
            "summary": { "lengthInMeters": 5200, "travelTimeInSeconds": 780 },
            "legs": [{ "points": points }]
        }]
    }))
}

#[tokio::test]
async fn region_provider_empty_routes_keeps_last_good_route() {
    let mock = Arc::new(MockOsrm::default());
    let app = Router::new()
        .route("/routing/1/calculateRoute/:locations/json", post(tomtom_route))
        .with_state(mock.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = TomTomClient::new(
        format!("http://{}", addr),
        Some("test-key".to_string()),
        Duration::from_secs(5),
    )
    .unwrap();
    let config = Config {
        planning_debounce: Duration::ZERO,
        ..Config::default()
    };
    let state = Arc::new(AppState::with_provider(config, AnyProvider::TomTom(client)));

    let session = state.create_session(inputs(72.81)).unwrap();
    assert!(session.wait_settled(Duration::from_secs(5)).await);
    let good = session.snapshot().route.unwrap();
    assert!(!good.summary.estimated);
    assert_eq!(good.summary.duration_label, "13m");

    mock.mode.store(MODE_NO_ROUTE, Ordering::SeqCst);
    state.update_session(session.id(), inputs(72.95)).unwrap();
    assert!(session.wait_settled(Duration::from_secs(5)).await);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.error.unwrap().kind, RouteErrorKind::NoRoute);
    let kept = snapshot.route.unwrap();
    assert!(kept.polyline.approx_eq(&good.polyline, 1e-12));
    assert_eq!(mock.calls.load(Ordering::SeqCst), 2);
}
