//! In-process fake of the RentX API for integration tests.

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rentx_client::{App, Config};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;

/// One request as the server saw it.
#[derive(Debug, Clone)]
pub struct Seen {
    pub path: String,
    pub authorization: Option<String>,
}

/// Mutable behavior and recordings of the fake server.
pub struct FakeState {
    /// email -> (password, login response)
    pub accounts: HashMap<String, (String, Value)>,
    pub login_status: Option<StatusCode>,
    /// When set, logins wait for a notification before answering
    pub login_gate: Option<Arc<Notify>>,
    pub pull_body: Value,
    pub pull_status: Option<StatusCode>,
    pub pull_versions: Vec<u64>,
    pub push_status: Option<StatusCode>,
    pub pushes: Vec<Value>,
    /// When set, pushes wait for a notification before answering
    pub push_gate: Option<Arc<Notify>>,
    pub cars: Vec<Value>,
    pub rentals: Vec<Value>,
    pub bookings: Vec<Value>,
    pub seen: Vec<Seen>,
}

impl Default for FakeState {
    fn default() -> Self {
        let mut accounts = HashMap::new();
        accounts.insert(
            "a@b.com".to_string(),
            (
                "secret".to_string(),
                json!({
                    "token": "T1",
                    "user": {
                        "id": "u1",
                        "name": "Ana",
                        "driver_license": "DL1",
                        "avatar": "",
                        "email": "a@b.com"
                    }
                }),
            ),
        );

        Self {
            accounts,
            login_status: None,
            login_gate: None,
            pull_body: pull_body(vec![], vec![], vec![], 0),
            pull_status: None,
            pull_versions: Vec::new(),
            push_status: None,
            pushes: Vec::new(),
            push_gate: None,
            cars: Vec::new(),
            rentals: Vec::new(),
            bookings: Vec::new(),
            seen: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct FakeServer {
    pub url: String,
    state: Arc<Mutex<FakeState>>,
    /// Notified each time a login reaches the server
    pub login_started: Arc<Notify>,
    /// Notified each time a push reaches the server
    pub push_started: Arc<Notify>,
}

impl FakeServer {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(FakeState::default()));
        let login_started = Arc::new(Notify::new());
        let push_started = Arc::new(Notify::new());
        let shared = Shared {
            state: state.clone(),
            login_started: login_started.clone(),
            push_started: push_started.clone(),
        };

        let router = Router::new()
            .route("/sessions", post(login))
            .route("/cars", get(list_cars))
            .route("/cars/sync/pull", get(pull))
            .route("/cars/{id}", get(get_car))
            .route("/users/sync", post(push))
            .route("/rentals", get(list_rentals).post(create_rental))
            .with_state(shared);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            url: format!("http://{addr}"),
            state,
            login_started,
            push_started,
        }
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn config(&self) -> Config {
        Config::new(&self.url, "sqlite::memory:")
            .with_http_timeout(Duration::from_secs(5))
            .with_sync_min_interval(Duration::ZERO)
    }

    /// An app on a fresh in-memory database, already restored.
    pub async fn app(&self) -> App {
        App::open(self.config()).await.unwrap()
    }

    pub fn set_pull(&self, body: Value) {
        let mut state = self.state();
        state.pull_body = body;
        state.pull_status = None;
    }

    pub fn fail_pull(&self, status: StatusCode) {
        self.state().pull_status = Some(status);
    }

    /// Authorization headers seen on requests to `path`.
    pub fn authorizations(&self, path: &str) -> Vec<Option<String>> {
        self.state()
            .seen
            .iter()
            .filter(|seen| seen.path == path)
            .map(|seen| seen.authorization.clone())
            .collect()
    }
}

pub fn car_json(id: &str, brand: &str, price: u64) -> Value {
    json!({
        "id": id,
        "brand": brand,
        "name": format!("{brand} {id}"),
        "about": "A car",
        "fuel_type": "gasoline",
        "period": "Ao dia",
        "price": price,
        "thumbnail": format!("{id}.png"),
        "photos": [{"id": format!("{id}-p1"), "photo": format!("{id}-front.png")}],
        "accessories": [{"id": format!("{id}-a1"), "type": "speed", "name": "200 km/h"}]
    })
}

pub fn pull_body(created: Vec<Value>, updated: Vec<Value>, deleted: Vec<&str>, latest: u64) -> Value {
    json!({
        "changes": {
            "cars": {"created": created, "updated": updated, "deleted": deleted},
            "users": {"created": [], "updated": [], "deleted": []}
        },
        "latestVersion": latest
    })
}

#[derive(Clone)]
struct Shared {
    state: Arc<Mutex<FakeState>>,
    login_started: Arc<Notify>,
    push_started: Arc<Notify>,
}

impl Shared {
    fn record(&self, path: &str, headers: &HeaderMap) -> MutexGuard<'_, FakeState> {
        let mut state = self.state.lock().unwrap();
        state.seen.push(Seen {
            path: path.to_string(),
            authorization: headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        });
        state
    }
}

async fn login(State(s): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let gate = s.record("/sessions", &headers).login_gate.clone();
    s.login_started.notify_one();
    if let Some(gate) = gate {
        gate.notified().await;
    }

    let state = s.state.lock().unwrap();
    if let Some(status) = state.login_status {
        return status.into_response();
    }

    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    match state.accounts.get(email) {
        Some((expected, response)) if expected == password => Json(response.clone()).into_response(),
        _ => (StatusCode::BAD_REQUEST, "invalid email or password").into_response(),
    }
}

async fn list_cars(State(s): State<Shared>, headers: HeaderMap) -> Response {
    let state = s.record("/cars", &headers);
    Json(state.cars.clone()).into_response()
}

async fn get_car(State(s): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    let state = s.record("/cars/{id}", &headers);
    match state.cars.iter().find(|car| car["id"] == id.as_str()) {
        Some(car) => Json(car.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn pull(
    State(s): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut state = s.record("/cars/sync/pull", &headers);
    let version = query
        .get("lastPulledVersion")
        .and_then(|v| v.parse().ok())
        .unwrap_or(u64::MAX);
    state.pull_versions.push(version);

    if let Some(status) = state.pull_status {
        return status.into_response();
    }
    Json(state.pull_body.clone()).into_response()
}

async fn push(State(s): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let (gate, status) = {
        let mut state = s.record("/users/sync", &headers);
        state.pushes.push(body);
        (state.push_gate.clone(), state.push_status)
    };

    s.push_started.notify_one();
    if let Some(gate) = gate {
        gate.notified().await;
    }

    match status {
        Some(status) => status.into_response(),
        None => StatusCode::OK.into_response(),
    }
}

async fn create_rental(
    State(s): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = s.record("/rentals", &headers);
    let mut record = body.clone();
    record["id"] = json!(format!("r{}", state.bookings.len() + 1));
    state.bookings.push(body);
    (StatusCode::CREATED, Json(record)).into_response()
}

async fn list_rentals(State(s): State<Shared>, headers: HeaderMap) -> Response {
    let state = s.record("/rentals", &headers);
    Json(state.rentals.clone()).into_response()
}
