use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::get,
};
use reqwest::{Client, redirect::Policy};
use serde_json::{Value, json};
use std::net::TcpListener as StdListener;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::time::sleep;

const GOOD_TOKEN: &str = "good-token";

/// In-process stand-in for the REST backend.
#[derive(Clone)]
struct Backend {
    token_valid: Arc<AtomicBool>,
    posts: Arc<AtomicUsize>,
    workouts: Arc<Mutex<Vec<Value>>>,
    check_delay: Duration,
}

impl Backend {
    fn new(workouts: Vec<Value>) -> Self {
        Self {
            token_valid: Arc::new(AtomicBool::new(true)),
            posts: Arc::new(AtomicUsize::new(0)),
            workouts: Arc::new(Mutex::new(workouts)),
            check_delay: Duration::ZERO,
        }
    }

    /// Holds `/auth/me` answers back so the stored-token check stays pending.
    fn with_slow_check(mut self, delay: Duration) -> Self {
        self.check_delay = delay;
        self
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let bearer = format!("Bearer {GOOD_TOKEN}");
        self.token_valid.load(Ordering::SeqCst)
            && headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) == Some(bearer.as_str())
    }

    fn revoke(&self) {
        self.token_valid.store(false, Ordering::SeqCst);
    }

    fn post_count(&self) -> usize {
        self.posts.load(Ordering::SeqCst)
    }
}

fn user() -> Value {
    json!({ "id": 1, "username": "alex", "email": null })
}

fn rejected() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "invalid token" }))).into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["username"] == "alex" && body["password"] == "secret1" {
        Json(json!({ "token": GOOD_TOKEN, "user": user() })).into_response()
    } else {
        rejected()
    }
}

async fn me(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    sleep(backend.check_delay).await;
    if !backend.authorized(&headers) {
        return rejected();
    }
    Json(user()).into_response()
}

async fn exercises(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if !backend.authorized(&headers) {
        return rejected();
    }
    Json(json!([
        { "id": 1, "name": "Squats", "category": "Legs", "muscle": "Quadriceps", "description": "", "image": "🏋️" },
        { "id": 2, "name": "Push-ups", "category": "Chest", "muscle": "Chest", "description": "", "image": "💪" }
    ]))
    .into_response()
}

async fn list_workouts(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if !backend.authorized(&headers) {
        return rejected();
    }
    let workouts = backend.workouts.lock().expect("workouts lock").clone();
    Json(Value::Array(workouts)).into_response()
}

async fn create_workout(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if !backend.authorized(&headers) {
        return rejected();
    }
    backend.posts.fetch_add(1, Ordering::SeqCst);
    let mut workouts = backend.workouts.lock().expect("workouts lock");
    let id = workouts.len() as i64 + 1;
    body["id"] = json!(id);
    workouts.push(body);
    (
        StatusCode::CREATED,
        Json(json!({ "id": id, "message": "Workout created successfully" })),
    )
        .into_response()
}

async fn spawn_backend(backend: Backend) -> String {
    let app = Router::new()
        .route("/api/auth/login", axum::routing::post(login))
        .route("/api/auth/me", get(me))
        .route("/api/exercises", get(exercises))
        .route("/api/workouts", get(list_workouts).post(create_workout))
        .route("/api/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .with_state(backend);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind backend");
    let addr = listener.local_addr().expect("backend addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/api")
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn pick_free_port() -> u16 {
    let listener = StdListener::bind("127.0.0.1:0").expect("bind random port");
    listener.local_addr().expect("local addr").port()
}

fn client() -> Client {
    Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("http client")
}

async fn wait_until_ready(base_url: &str) {
    let client = client();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/session")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server(api_base_url: &str, token: Option<&str>) -> TestServer {
    let port = pick_free_port();
    let mut command = Command::new(env!("CARGO_BIN_EXE_fitness_tracker"));
    command
        .env("PORT", port.to_string())
        .env("API_BASE_URL", api_base_url)
        .env("APP_UTC_OFFSET", "+00:00")
        .env("RUST_LOG", "info")
        .env_remove("FITNESS_TOKEN")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    if let Some(token) = token {
        command.env("FITNESS_TOKEN", token);
    }
    let child = command.spawn().expect("failed to spawn server");

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;
    TestServer { base_url, child }
}

async fn session_state(client: &Client, server: &TestServer) -> String {
    let body: Value = client
        .get(format!("{}/api/session", server.base_url))
        .send()
        .await
        .expect("session request")
        .json()
        .await
        .expect("session json");
    body["state"].as_str().unwrap_or_default().to_string()
}

async fn sign_in(client: &Client, server: &TestServer) {
    let resp = client
        .post(format!("{}/api/login", server.base_url))
        .json(&json!({ "username": "alex", "password": "secret1" }))
        .send()
        .await
        .expect("login request");
    assert_eq!(resp.status(), StatusCode::OK);
    let user: Value = resp.json().await.expect("login json");
    assert_eq!(user["username"], "alex");
}

#[tokio::test]
async fn signed_out_pages_redirect_to_login() {
    let backend = Backend::new(Vec::new());
    let api = spawn_backend(backend).await;
    let server = spawn_server(&api, None).await;
    let client = client();

    let resp = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .expect("dashboard request");
    assert!(resp.status().is_redirection());
    assert_eq!(resp.headers()["location"], "/login");

    let resp = client
        .get(format!("{}/api/dashboard", server.base_url))
        .send()
        .await
        .expect("api dashboard request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let page = client
        .get(format!("{}/login", server.base_url))
        .send()
        .await
        .expect("login page")
        .text()
        .await
        .expect("login html");
    assert!(page.contains("Welcome Back"));
}

#[tokio::test]
async fn empty_history_renders_zero_dashboard() {
    let backend = Backend::new(Vec::new());
    let api = spawn_backend(backend).await;
    let server = spawn_server(&api, None).await;
    let client = client();
    sign_in(&client, &server).await;

    let summary: Value = client
        .get(format!("{}/api/dashboard", server.base_url))
        .send()
        .await
        .expect("dashboard request")
        .json()
        .await
        .expect("dashboard json");
    assert_eq!(summary["total_workouts"], 0);
    assert_eq!(summary["this_week"], 0);
    assert_eq!(summary["total_entries"], 0);
    assert_eq!(summary["total_duration"], 0);
    assert_eq!(summary["recent"], json!([]));

    let resp = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .expect("dashboard page");
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.expect("dashboard html");
    assert!(html.contains("No workouts yet"));
}

#[tokio::test]
async fn invalid_workout_never_reaches_backend() {
    let backend = Backend::new(Vec::new());
    let api = spawn_backend(backend.clone()).await;
    let server = spawn_server(&api, None).await;
    let client = client();
    sign_in(&client, &server).await;

    let resp = client
        .post(format!("{}/api/workouts", server.base_url))
        .json(&json!({
            "name": "Leg Day",
            "exercises": [{ "exerciseId": 1, "sets": 0, "reps": 10 }]
        }))
        .send()
        .await
        .expect("invalid save");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.expect("error json");
    assert!(body["error"].as_str().unwrap_or_default().contains("Sets"));
    assert_eq!(backend.post_count(), 0);

    let resp = client
        .post(format!("{}/api/workouts", server.base_url))
        .json(&json!({
            "name": "Leg Day",
            "duration": 40,
            "exercises": [{ "exerciseId": 1, "sets": 3, "reps": 10, "weight": 60.0 }]
        }))
        .send()
        .await
        .expect("valid save");
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(backend.post_count(), 1);

    let summary: Value = client
        .get(format!("{}/api/dashboard", server.base_url))
        .send()
        .await
        .expect("dashboard request")
        .json()
        .await
        .expect("dashboard json");
    assert_eq!(summary["total_workouts"], 1);
    assert_eq!(summary["total_duration"], 40);
}

#[tokio::test]
async fn concurrent_rejections_raise_one_expiry_notice() {
    let backend = Backend::new(Vec::new());
    let api = spawn_backend(backend.clone()).await;
    let server = spawn_server(&api, Some(GOOD_TOKEN)).await;
    let client = client();

    let deadline = Instant::now() + Duration::from_secs(5);
    while session_state(&client, &server).await != "authenticated" {
        assert!(Instant::now() < deadline, "stored token was never accepted");
        sleep(Duration::from_millis(50)).await;
    }

    backend.revoke();
    let requests = (0..5).map(|_| {
        client
            .get(format!("{}/api/dashboard", server.base_url))
            .send()
    });
    let responses = futures_join(requests).await;
    for resp in responses {
        assert_eq!(resp.expect("dashboard request").status(), StatusCode::UNAUTHORIZED);
    }

    assert_eq!(session_state(&client, &server).await, "unauthenticated");
    let notices: Value = client
        .get(format!("{}/api/notices", server.base_url))
        .send()
        .await
        .expect("notices request")
        .json()
        .await
        .expect("notices json");
    let notices = notices.as_array().cloned().unwrap_or_default();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0]["message"], "Your session expired. Please sign in again.");

    let resp = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .expect("dashboard page");
    assert!(resp.status().is_redirection());
    assert_eq!(resp.headers()["location"], "/login");
}

#[tokio::test]
async fn pages_wait_while_stored_token_is_checked() {
    let backend = Backend::new(Vec::new()).with_slow_check(Duration::from_secs(4));
    let api = spawn_backend(backend).await;
    let server = spawn_server(&api, Some(GOOD_TOKEN)).await;
    let client = client();

    assert_eq!(session_state(&client, &server).await, "authenticating");

    let resp = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .expect("dashboard page");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get("location").is_none());
    let html = resp.text().await.expect("loading html");
    assert!(html.contains("Checking your session"));

    let resp = client
        .get(format!("{}/api/dashboard", server.base_url))
        .send()
        .await
        .expect("api dashboard");
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let deadline = Instant::now() + Duration::from_secs(10);
    while session_state(&client, &server).await != "authenticated" {
        assert!(Instant::now() < deadline, "stored token was never accepted");
        sleep(Duration::from_millis(100)).await;
    }
    let html = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .expect("dashboard page")
        .text()
        .await
        .expect("dashboard html");
    assert!(html.contains("No workouts yet"));
}

#[tokio::test]
async fn wrong_password_keeps_notices_clean() {
    let backend = Backend::new(Vec::new());
    let api = spawn_backend(backend).await;
    let server = spawn_server(&api, None).await;
    let client = client();
    sign_in(&client, &server).await;

    let resp = client
        .post(format!("{}/api/login", server.base_url))
        .json(&json!({ "username": "alex", "password": "not-it" }))
        .send()
        .await
        .expect("login request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(session_state(&client, &server).await, "unauthenticated");

    let notices: Value = client
        .get(format!("{}/api/notices", server.base_url))
        .send()
        .await
        .expect("notices request")
        .json()
        .await
        .expect("notices json");
    assert_eq!(notices, json!([]));
}

async fn futures_join<F, T>(futures: impl Iterator<Item = F>) -> Vec<T>
where
    F: std::future::Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let handles: Vec<_> = futures.map(tokio::spawn).collect();
    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.expect("request task"));
    }
    results
}

#[tokio::test]
async fn progress_averages_durations_across_days() {
    let backend = Backend::new(vec![
        json!({
            "id": 1, "name": "Morning", "date": "2026-01-05T08:00:00", "duration": 30,
            "exercises": [{ "exerciseId": 1, "sets": 3, "reps": 10 }]
        }),
        json!({
            "id": 2, "name": "Evening", "date": "2026-01-07T19:30:00", "duration": 45,
            "exercises": [
                { "exerciseId": 1, "sets": 3, "reps": 8 },
                { "exerciseId": 2, "sets": 2, "reps": 15 }
            ]
        }),
    ]);
    let api = spawn_backend(backend).await;
    let server = spawn_server(&api, None).await;
    let client = client();
    sign_in(&client, &server).await;

    let report: Value = client
        .get(format!("{}/api/progress?view=daily", server.base_url))
        .send()
        .await
        .expect("progress request")
        .json()
        .await
        .expect("progress json");
    assert_eq!(report["totals"]["total_workouts"], 2);
    assert_eq!(report["totals"]["total_entries"], 3);
    assert_eq!(report["totals"]["total_duration"], 75);
    assert_eq!(report["totals"]["average_duration"], 38);
    assert_eq!(report["activity"].as_array().map(Vec::len), Some(2));
    assert_eq!(report["top_exercises"][0]["name"], "Squats");
    assert_eq!(report["top_exercises"][0]["count"], 2);

    let html = client
        .get(format!("{}/progress?view=weekly", server.base_url))
        .send()
        .await
        .expect("progress page")
        .text()
        .await
        .expect("progress html");
    assert!(html.contains("Weekly Activity"));
    assert!(html.contains("Squats"));
}
