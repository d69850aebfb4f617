//! Shared test fixtures: a fake OpenAI-compatible API and temp configs.

#![allow(dead_code)]

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const TEST_API_KEY: &str = "test-key";

/// Keywords that define the fake embedding space.
const KEYWORDS: [&str; 4] = ["error", "disk", "login", "timeout"];

type Requests = Arc<Mutex<Vec<(String, Value)>>>;

/// A fake OpenAI API on a background thread.
pub struct MockOpenAI {
    pub port: u16,
    /// `(path, body)` for every authorized request received.
    pub requests: Requests,
}

impl MockOpenAI {
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .count()
    }

    pub fn last_chat_request(&self) -> Option<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(p, _)| p == "/v1/chat/completions")
            .map(|(_, body)| body.clone())
    }
}

/// Start the fake API. Embeddings count keyword hits; chat replies with the
/// first line of the first excerpt in the prompt, padded with whitespace.
/// A question containing `FAIL_MODEL` gets a 500.
pub fn start_mock_openai() -> MockOpenAI {
    let requests: Requests = Arc::new(Mutex::new(Vec::new()));
    let state = requests.clone();
    let (tx, rx) = std::sync::mpsc::channel();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap().port()).unwrap();
            let app = Router::new()
                .route("/v1/embeddings", post(mock_embeddings))
                .route("/v1/chat/completions", post(mock_chat))
                .with_state(state);
            axum::serve(listener, app).await.unwrap();
        });
    });

    let port = rx.recv().unwrap();
    MockOpenAI { port, requests }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TEST_API_KEY))
        .unwrap_or(false)
}

pub fn keyword_vector(text: &str) -> Vec<f32> {
    let t = text.to_lowercase();
    KEYWORDS
        .iter()
        .map(|k| t.matches(k).count() as f32 + 0.01)
        .collect()
}

async fn mock_embeddings(
    State(requests): State<Requests>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "invalid api key").into_response();
    }
    requests
        .lock()
        .unwrap()
        .push(("/v1/embeddings".to_string(), body.clone()));

    let inputs: Vec<String> = body["input"]
        .as_array()
        .map(|a| {
            a.iter()
                .map(|v| v.as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default();

    let data: Vec<Value> = inputs
        .iter()
        .enumerate()
        .map(|(i, text)| json!({"index": i, "embedding": keyword_vector(text)}))
        .collect();

    Json(json!({"object": "list", "data": data})).into_response()
}

async fn mock_chat(
    State(requests): State<Requests>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "invalid api key").into_response();
    }
    requests
        .lock()
        .unwrap()
        .push(("/v1/chat/completions".to_string(), body.clone()));

    let user = body["messages"]
        .as_array()
        .and_then(|m| m.last())
        .and_then(|m| m["content"].as_str())
        .unwrap_or_default()
        .to_string();

    if user.contains("FAIL_MODEL") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream overloaded").into_response();
    }

    let top = user
        .split("Log excerpts:\n")
        .nth(1)
        .and_then(|rest| rest.lines().next())
        .unwrap_or("nothing")
        .to_string();

    Json(json!({
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": format!("  Top excerpt: {}  \n", top)}},
            {"index": 1, "message": {"role": "assistant", "content": "ignored second choice"}}
        ]
    }))
    .into_response()
}

pub const SAMPLE_LOG: &str = "2024-06-01 09:00:00 INFO service started\n\
2024-06-01 09:05:12 WARN login failed for user alice\n\
2024-06-01 09:07:44 ERROR disk /var full, disk usage 100%\n\
2024-06-01 09:08:00 ERROR request timeout after 30s\n";

/// Temp dir with a config pointing both providers at `api_url` and a
/// sample log. Each log line becomes its own chunk (`limit = 40`).
pub fn setup_env(api_url: &str) -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let log_path = root.join("app.log");
    fs::write(&log_path, SAMPLE_LOG).unwrap();

    let config = format!(
        r#"[chunking]
limit = 40

[retrieval]
top_k = 2

[embedding]
provider = "openai"
model = "text-embedding-3-small"
url = "{url}"
batch_size = 2
timeout_secs = 5

[completion]
provider = "openai"
model = "gpt-4"
url = "{url}"
timeout_secs = 5
"#,
        url = api_url
    );
    let config_path = root.join("logqa.toml");
    fs::write(&config_path, config).unwrap();

    (tmp, config_path, log_path)
}

pub fn logqa_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_logqa"))
}

/// Run `logqa --config <config> <args>` with the test API key set.
pub fn run_logqa(config_path: &Path, args: &[&str], stdin: Option<&str>) -> Output {
    let mut cmd = Command::new(logqa_binary());
    cmd.arg("--config")
        .arg(config_path)
        .args(args)
        .env("OPENAI_API_KEY", TEST_API_KEY)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    run_with_stdin(cmd, stdin)
}

pub fn run_with_stdin(mut cmd: Command, stdin: Option<&str>) -> Output {
    use std::io::Write;

    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });
    let mut child = cmd
        .spawn()
        .unwrap_or_else(|e| panic!("Failed to run logqa binary: {}", e));
    if let Some(input) = stdin {
        let mut pipe = child.stdin.take().unwrap();
        pipe.write_all(input.as_bytes()).unwrap();
    }
    child.wait_with_output().unwrap()
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}
