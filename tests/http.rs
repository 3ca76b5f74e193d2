use axum::{extract::Path, http::StatusCode, routing::get, Json, Router};
use chrono::{Duration as DateDuration, Utc};
use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct Summary {
    done_count: usize,
    total_count: usize,
    percent: u8,
}

#[derive(Debug, Deserialize)]
struct Cell {
    date: String,
    state: String,
}

#[derive(Debug, Deserialize)]
struct Row {
    label: String,
    cells: Vec<Cell>,
}

#[derive(Debug, Deserialize)]
struct Grid {
    rows: Vec<Row>,
    summary: Summary,
}

#[derive(Debug, Deserialize)]
struct ToggleResponse {
    date: String,
    done: bool,
    cell: Option<Cell>,
    summary: Summary,
}

#[derive(Debug, Deserialize)]
struct ExportDocument {
    done: Vec<String>,
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

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("day_tracker_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/grid")).send().await {
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

fn server_command(port: u16) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_day_tracker"));
    command
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", unique_data_path())
        .env("TRACKER_STATIC_ROOT", std::env::temp_dir())
        .env("TZ", "UTC")
        .env("RUST_LOG", "info")
        .env_remove("TRACKER_CALENDAR_URL")
        .env_remove("TRACKER_ENTITY")
        .env_remove("TRACKER_ENTITIES")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    command
}

async fn spawn_server(extra_env: &[(&str, &str)]) -> TestServer {
    let port = pick_free_port();
    let mut command = server_command(port);
    for (key, value) in extra_env {
        command.env(key, value);
    }
    let child = command.spawn().expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server(&[]).await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn import(client: &Client, base_url: &str, body: &str) -> reqwest::Response {
    client
        .post(format!("{base_url}/api/import"))
        .header("content-type", "application/json")
        .body(body.to_string())
        .send()
        .await
        .unwrap()
}

async fn toggle(client: &Client, base_url: &str, date: &str) -> ToggleResponse {
    client
        .post(format!("{base_url}/api/toggle"))
        .json(&json!({ "date": date }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn export(client: &Client, base_url: &str) -> BTreeSet<String> {
    let document: ExportDocument = client
        .get(format!("{base_url}/api/export"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    document.done.into_iter().collect()
}

#[tokio::test]
async fn http_toggle_past_day_round_trips() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    // The server runs with TZ=UTC.
    let yesterday = (Utc::now().date_naive() - DateDuration::days(1))
        .format("%Y-%m-%d")
        .to_string();

    let response = import(&client, &server.base_url, "[]").await;
    assert!(response.status().is_success());

    let first = toggle(&client, &server.base_url, &yesterday).await;
    assert_eq!(first.date, yesterday);
    assert!(first.done);
    assert_eq!(first.cell.as_ref().map(|c| c.state.as_str()), Some("done"));
    assert_eq!(first.summary.done_count, 1);
    assert!(first.summary.total_count > 300);

    let second = toggle(&client, &server.base_url, &yesterday).await;
    assert!(!second.done);
    let cell = second.cell.expect("yesterday is always visible");
    assert_eq!(cell.date, yesterday);
    assert_eq!(cell.state, "not-done");
    assert_eq!(second.summary.done_count, 0);
    assert_eq!(second.summary.percent, 0);
}

#[tokio::test]
async fn http_toggle_rejects_bad_dates() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/toggle", server.base_url))
        .json(&json!({ "date": "2024-02-30" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_import_then_export() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = import(&client, &server.base_url, r#"{"done": ["2024-01-01","2024-01-02"]}"#).await;
    assert!(response.status().is_success());
    let grid: Grid = response.json().await.unwrap();
    assert_eq!(grid.rows.len(), 12);
    assert!(!grid.rows[11].label.is_empty());
    let cells: usize = grid.rows.iter().map(|row| row.cells.len()).sum();
    assert_eq!(cells, grid.summary.total_count);
    assert!(grid.summary.percent <= 100);

    let response = client
        .get(format!("{}/api/export", server.base_url))
        .send()
        .await
        .unwrap();
    let disposition = response.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.contains("day-tracker.json"));

    let exported = export(&client, &server.base_url).await;
    let expected: BTreeSet<String> = ["2024-01-01", "2024-01-02"].into_iter().map(String::from).collect();
    assert_eq!(exported, expected);
}

#[tokio::test]
async fn http_invalid_import_changes_nothing() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = import(&client, &server.base_url, r#"["2023-05-01"]"#).await;
    assert!(response.status().is_success());

    for body in [r#"{"days": []}"#, "not json", r#"["2023-05-02", 12]"#] {
        let response = import(&client, &server.base_url, body).await;
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST, "body {body}");
    }

    let exported = export(&client, &server.base_url).await;
    assert_eq!(exported, BTreeSet::from(["2023-05-01".to_string()]));
}

#[tokio::test]
async fn http_index_and_static_fallback() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let html = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(html.matches(r#"class="month-row""#).count(), 12);
    assert!(html.contains("Day Tracker"));

    let missing = client
        .get(format!("{}/definitely-missing-{}.js", server.base_url, std::process::id()))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    let response = client
        .post(format!("{}/api/refresh", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_preferences_persist() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    for show in [true, false] {
        let response = client
            .post(format!("{}/api/preferences", server.base_url))
            .json(&json!({ "show_week_separators": show }))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());

        let current: Value = client
            .get(format!("{}/api/preferences", server.base_url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(current["show_week_separators"], json!(show));
    }
}

async fn fake_calendar(Path(entity): Path<String>) -> Result<Json<Value>, StatusCode> {
    match entity.as_str() {
        "calendar.good" => Ok(Json(json!([{ "summary": "gym", "start_date": "2024-02-05T00:00:00Z" }]))),
        _ => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

#[tokio::test]
async fn http_refresh_merges_remote_events() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let calendar_url = format!("http://{}", listener.local_addr().unwrap());
    let app = Router::new().route("/api/calendars/:entity", get(fake_calendar));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // West of UTC, the midnight-UTC event must still land on its UTC day.
    let server = spawn_server(&[
        ("TZ", "America/New_York"),
        ("TRACKER_CALENDAR_URL", calendar_url.as_str()),
        ("TRACKER_CALENDAR_TOKEN", "secret"),
        ("TRACKER_ENTITIES", "calendar.good,calendar.broken"),
    ])
    .await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/refresh", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert!(body["added"].as_u64().unwrap() <= 1);

    let exported = export(&client, &server.base_url).await;
    assert_eq!(exported, BTreeSet::from(["2024-02-05".to_string()]));
}

#[test]
fn calendar_without_entity_refuses_to_start() {
    let status = server_command(pick_free_port())
        .env("TRACKER_CALENDAR_URL", "http://127.0.0.1:9")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .expect("failed to run server");
    assert!(!status.success());
}
