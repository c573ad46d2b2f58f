use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use kirakuji_server::api::build_app;
use kirakuji_server::core::WorkerMode;
use kirakuji_server::{
    Config, DrawStore, Formatter, FormatterError, MemoryStore, PostStore, RedbStore, Server,
    ServerState,
};
use serde_json::{Value, json};
use tower::ServiceExt;

/// 按投稿内容给出固定改写结果
struct ScriptFormatter;

#[async_trait]
impl Formatter for ScriptFormatter {
    async fn format(&self, raw: &str) -> Result<String, FormatterError> {
        match raw {
            "short" => Ok("短いです".to_string()),
            "link" => Ok("詳しくは https://example.com をご覧ください、応援しています。".to_string()),
            "down" => Err(FormatterError::Status {
                status: 503,
                body: "unavailable".to_string(),
            }),
            other => Ok(format!("「{}」と感じたあなたは、もう十分に頑張っています。", other)),
        }
    }

    fn provider(&self) -> &'static str {
        "script"
    }
}

/// 前 `failures` 次调用失败，之后恢复
struct RecoveringFormatter {
    failures: AtomicUsize,
    calls: AtomicUsize,
}

#[async_trait]
impl Formatter for RecoveringFormatter {
    async fn format(&self, raw: &str) -> Result<String, FormatterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(FormatterError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(format!("「{}」と感じたあなたは、もう十分に頑張っています。", raw))
    }

    fn provider(&self) -> &'static str {
        "recovering"
    }
}

fn config(mode: WorkerMode) -> Config {
    Config {
        worker_mode: mode,
        worker_poll_interval_ms: 10,
        format_timeout_ms: 1000,
        fortune_seed: Some(11),
        ..Config::default()
    }
}

fn memory_state(mode: WorkerMode) -> ServerState {
    let store = Arc::new(MemoryStore::new());
    ServerState::new(config(mode), store.clone(), store, Some(Arc::new(ScriptFormatter)))
}

async fn call(state: &ServerState, request: Request<Body>) -> (StatusCode, Value) {
    let response = build_app(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn submit(state: &ServerState, post_id: &str, content: &str) -> StatusCode {
    let request = Request::post("/posts")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "post_id": post_id, "content": content }).to_string()))
        .unwrap();
    call(state, request).await.0
}

async fn random(state: &ServerState) -> (StatusCode, Value) {
    call(state, Request::get("/draws/random").body(Body::empty()).unwrap()).await
}

/// 等待 `post_id` 出现 Draw
async fn wait_for_draw(state: &ServerState, post_id: &str) -> shared::Draw {
    for _ in 0..300 {
        if let Ok(draw) = state.draws.get_by_post_id(post_id).await {
            return draw;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("no draw for {}", post_id);
}

async fn run_accept_and_reject(state: ServerState) {
    let tasks = state.start_background_tasks();

    let (status, _) = random(&state).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(submit(&state, "p-ok", "疲れた").await, StatusCode::CREATED);
    assert_eq!(submit(&state, "p-short", "short").await, StatusCode::CREATED);
    assert_eq!(submit(&state, "p-link", "link").await, StatusCode::CREATED);

    let verified = wait_for_draw(&state, "p-ok").await;
    assert!(verified.is_verified());
    let post = state.posts.find_by_id("p-ok").await.unwrap().unwrap();
    assert!(post.is_ready());
    assert_eq!(post.content(), verified.result());

    let short = wait_for_draw(&state, "p-short").await;
    assert_eq!(short.rejection_reason(), Some("too short"));
    assert!(!state.posts.find_by_id("p-short").await.unwrap().unwrap().is_ready());

    let link = wait_for_draw(&state, "p-link").await;
    assert_eq!(link.rejection_reason(), Some("no links allowed"));

    for _ in 0..5 {
        let (status, body) = random(&state).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["post_id"], "p-ok");
        assert_eq!(body["result"], "「疲れた」と感じたあなたは、もう十分に頑張っています。");
    }

    tasks.shutdown().await;
}

#[tokio::test]
async fn test_polling_pipeline_memory() {
    run_accept_and_reject(memory_state(WorkerMode::Polling)).await;
}

#[tokio::test]
async fn test_queue_pipeline_memory() {
    run_accept_and_reject(memory_state(WorkerMode::Queue)).await;
}

#[tokio::test]
async fn test_polling_pipeline_redb() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RedbStore::open(dir.path().join("kirakuji.redb")).unwrap());
    let state = ServerState::new(
        config(WorkerMode::Polling),
        store.clone(),
        store,
        Some(Arc::new(ScriptFormatter)),
    );
    run_accept_and_reject(state).await;
}

#[tokio::test]
async fn test_redb_results_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kirakuji.redb");

    {
        let store = Arc::new(RedbStore::open(&path).unwrap());
        let state = ServerState::new(
            config(WorkerMode::Polling),
            store.clone(),
            store,
            Some(Arc::new(ScriptFormatter)),
        );
        let tasks = state.start_background_tasks();
        assert_eq!(submit(&state, "p-1", "寂しい").await, StatusCode::CREATED);
        wait_for_draw(&state, "p-1").await;
        tasks.shutdown().await;
    }

    let store = Arc::new(RedbStore::open(&path).unwrap());
    let state = ServerState::new(config(WorkerMode::Disabled), store.clone(), store, None);
    let (status, body) = random(&state).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["post_id"], "p-1");
}

#[tokio::test]
async fn test_formatter_outage_leaves_post_pending() {
    let state = memory_state(WorkerMode::Polling);
    let tasks = state.start_background_tasks();

    assert_eq!(submit(&state, "p-down", "down").await, StatusCode::CREATED);
    assert_eq!(submit(&state, "p-up", "眠い").await, StatusCode::CREATED);

    // later posts are still processed while one keeps failing
    wait_for_draw(&state, "p-up").await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(state.draws.get_by_post_id("p-down").await.is_err());
    assert!(!state.posts.find_by_id("p-down").await.unwrap().unwrap().is_ready());

    tasks.shutdown().await;
}

async fn run_recovers_after_formatter_outage(mode: WorkerMode) {
    let store = Arc::new(MemoryStore::new());
    let formatter = Arc::new(RecoveringFormatter {
        failures: AtomicUsize::new(3),
        calls: AtomicUsize::new(0),
    });
    let state = ServerState::new(config(mode), store.clone(), store, Some(formatter.clone()));
    let tasks = state.start_background_tasks();

    assert_eq!(submit(&state, "p-flaky", "眠れない").await, StatusCode::CREATED);

    let draw = wait_for_draw(&state, "p-flaky").await;
    assert!(draw.is_verified());
    assert!(state.posts.find_by_id("p-flaky").await.unwrap().unwrap().is_ready());
    // three failures, then one success
    assert_eq!(formatter.calls.load(Ordering::SeqCst), 4);

    let (status, body) = random(&state).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["post_id"], "p-flaky");

    tasks.shutdown().await;
}

#[tokio::test]
async fn test_polling_recovers_after_formatter_outage() {
    run_recovers_after_formatter_outage(WorkerMode::Polling).await;
}

#[tokio::test]
async fn test_queue_recovers_after_formatter_outage() {
    run_recovers_after_formatter_outage(WorkerMode::Queue).await;
}

#[tokio::test]
async fn test_queue_post_behind_parked_posts_is_processed() {
    let state = memory_state(WorkerMode::Queue);
    let tasks = state.start_background_tasks();

    assert_eq!(submit(&state, "a", "short").await, StatusCode::CREATED);
    assert_eq!(submit(&state, "c", "short").await, StatusCode::CREATED);
    wait_for_draw(&state, "a").await;
    wait_for_draw(&state, "c").await;

    assert_eq!(submit(&state, "b", "落ち込んでいる").await, StatusCode::CREATED);
    assert!(wait_for_draw(&state, "b").await.is_verified());
    assert!(state.jobs.as_ref().unwrap().is_empty());

    tasks.shutdown().await;
}

#[tokio::test]
async fn test_server_serves_over_tcp() {
    let state = memory_state(WorkerMode::Queue);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(Server::new(state).serve(listener, async {
        let _ = stop_rx.await;
    }));

    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let health: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["worker_mode"], "queue");

    let resp = client
        .post(format!("{}/posts", base))
        .json(&json!({ "post_id": "p-1", "content": "しんどい" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let mut drawn = None;
    for _ in 0..300 {
        let resp = client
            .get(format!("{}/draws/random", base))
            .send()
            .await
            .unwrap();
        if resp.status().as_u16() == 200 {
            drawn = Some(resp.json::<Value>().await.unwrap());
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let drawn = drawn.expect("draw never became available");
    assert_eq!(drawn["post_id"], "p-1");

    let _ = stop_tx.send(());
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}
