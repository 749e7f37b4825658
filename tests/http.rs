use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize, PartialEq)]
struct CallStatsResponse {
    calls: u64,
    inbound: u64,
    outbound: u64,
}

#[derive(Debug, Deserialize)]
struct TotalsResponse {
    date: String,
    inbound: u64,
    outbound: u64,
    total: u64,
}

#[derive(Debug, Deserialize)]
struct PendingCall {
    category_stat_key: String,
    inbound_minutes: u64,
}

#[derive(Debug, Deserialize)]
struct UndoResponse {
    pending: Option<PendingCall>,
    seconds_left: Option<u64>,
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

fn unique_data_dir() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("call_desk_http_{}_{}", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/totals")).send().await {
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

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_call_desk"))
        .env("PORT", port.to_string())
        .env("APP_DATA_DIR", unique_data_dir())
        .env("UNDO_WINDOW_SECS", "60")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

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
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn key_stats(client: &Client, base_url: &str, key: &str) -> CallStatsResponse {
    client
        .get(format!("{base_url}/api/stats/today/keys/{key}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_log_call_then_undo() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = key_stats(&client, &server.base_url, "helppi_vpn").await;

    let response = client
        .post(format!("{}/api/calls", server.base_url))
        .json(&serde_json::json!({
            "main_key": "helppi",
            "subcategory": "VPN",
            "inbound": [5, null, 2],
            "outbound": [null]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let after = key_stats(&client, &server.base_url, "helppi_vpn").await;
    assert_eq!(after.calls, before.calls + 1);
    assert_eq!(after.inbound, before.inbound + 7);
    assert_eq!(after.outbound, before.outbound);

    let undo: UndoResponse = client
        .get(format!("{}/api/undo", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let pending = undo.pending.expect("undo slot armed");
    assert_eq!(pending.category_stat_key, "helppi_vpn");
    assert_eq!(pending.inbound_minutes, 7);
    assert!(undo.seconds_left.unwrap_or(0) > 0);

    let response = client
        .post(format!("{}/api/undo", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(key_stats(&client, &server.base_url, "helppi_vpn").await, before);

    let response = client
        .post(format!("{}/api/undo", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn http_rejects_calls_without_time() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/calls", server.base_url))
        .json(&serde_json::json!({
            "main_key": "aspa",
            "subcategory": "Lasku",
            "inbound": [null],
            "outbound": [null]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let categories: serde_json::Value = client
        .get(format!("{}/api/categories", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let aspa = categories
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["key"] == "aspa")
        .expect("default category present");
    assert!(aspa["subcategories"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn http_duplicate_main_category_conflicts() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let url = format!("{}/api/categories", server.base_url);

    let name = format!("Laskutus {}", std::process::id());
    let response = client
        .post(&url)
        .json(&serde_json::json!({ "name": name }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .post(&url)
        .json(&serde_json::json!({ "name": name.to_uppercase() }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn http_index_and_totals_share_the_day() {
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

    let totals: TotalsResponse = client
        .get(format!("{}/api/totals?inbound=3&outbound=4", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(html.contains(&totals.date));
    assert!(totals.inbound >= 3);
    assert!(totals.outbound >= 4);
    assert_eq!(totals.total, totals.inbound + totals.outbound);
}

#[derive(Debug, Deserialize)]
struct StopwatchEntryResponse {
    name: String,
    duration: u64,
}

#[derive(Debug, Deserialize)]
struct StopwatchResponse {
    running: bool,
    elapsed_secs: u64,
    history: Vec<StopwatchEntryResponse>,
}

#[tokio::test]
async fn http_stopwatch_session_lands_in_history() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let base = &server.base_url;

    let started: StopwatchResponse = client
        .post(format!("{base}/api/stopwatch/start"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(started.running);

    sleep(Duration::from_millis(1200)).await;

    let name = format!("Backup check {}", std::process::id());
    let reset: StopwatchResponse = client
        .post(format!("{base}/api/stopwatch/reset"))
        .json(&serde_json::json!({ "name": name }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!reset.running);
    assert_eq!(reset.elapsed_secs, 0);
    assert_eq!(reset.history[0].name, name);
    assert!(reset.history[0].duration >= 1);

    let unconfirmed = client
        .delete(format!("{base}/api/stopwatch/history/0"))
        .send()
        .await
        .unwrap();
    assert!(unconfirmed.status().is_client_error());

    let confirmed = client
        .delete(format!("{base}/api/stopwatch/history/0?confirm=1"))
        .send()
        .await
        .unwrap();
    assert_eq!(confirmed.status(), StatusCode::NO_CONTENT);

    let after: StopwatchResponse = client
        .get(format!("{base}/api/stopwatch"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(after.history.iter().all(|entry| entry.name != name));
}
