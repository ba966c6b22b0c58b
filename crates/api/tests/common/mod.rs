#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ws::Message;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use stylist_api::auth::jwt::JwtConfig;
use stylist_api::config::{PipelineConfig, ServerConfig, TransformerConfig};
use stylist_api::engine::worker::{Worker, WorkerSettings};
use stylist_api::router::build_app_router;
use stylist_api::state::AppState;
use stylist_api::ws::TaskChannelRegistry;
use stylist_core::imaging::CompressionConfig;
use stylist_core::messages::TaskEvent;
use stylist_core::types::DbId;
use stylist_db::queue::MemoryTaskQueue;
use stylist_db::store::{MemoryStyleStore, MemoryTaskStore};
use stylist_transformer::{
    TransformOutcome, TransformRequest, TransformResponse, Transformer, TransformerError,
};
use tokio::sync::{mpsc, Mutex, Notify};
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";
pub const BOUNDARY: &str = "stylist-test-boundary";

// ---------------------------------------------------------------------------
// Configuration and app
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults and the in-memory backends.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
        },
        database_url: None,
        pipeline: PipelineConfig {
            max_upload_bytes: 512 * 1024,
            max_time_from_start: Duration::from_secs(60),
            max_processing: Duration::from_secs(120),
            result_ttl: Duration::from_secs(3600),
            long_processing_sweep_interval: Duration::from_secs(60),
            result_retention_sweep_interval: Duration::from_secs(60),
            worker_concurrency: 1,
            queue_poll_interval: Duration::from_millis(20),
            queue_visibility_timeout: Duration::from_secs(300),
            compression: CompressionConfig {
                min_bytes: 64 * 1024,
                ..CompressionConfig::default()
            },
        },
        transformer: TransformerConfig {
            url: "http://127.0.0.1:9".to_string(),
            api_key: "test-key".to_string(),
            timeout: Duration::from_secs(5),
            style_sync_interval: Duration::from_secs(3600),
        },
    }
}

/// Everything a test needs to drive the pipeline without a database.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub tasks: Arc<MemoryTaskStore>,
    pub styles: Arc<MemoryStyleStore>,
    pub queue: Arc<MemoryTaskQueue>,
    pub registry: Arc<TaskChannelRegistry>,
}

impl TestApp {
    /// Catalogue: `mosaic` and `candy` active, `retired` inactive.
    pub async fn new() -> Self {
        let config = Arc::new(test_config());
        let tasks = Arc::new(MemoryTaskStore::new());
        let styles = Arc::new(MemoryStyleStore::with_active(["mosaic", "candy", "retired"]));
        styles.set_active("retired", false).await;
        let queue = Arc::new(MemoryTaskQueue::new(
            config.pipeline.queue_visibility_timeout,
        ));
        let registry = Arc::new(TaskChannelRegistry::new());

        let state = AppState::new(
            Arc::clone(&config),
            tasks.clone(),
            styles.clone(),
            queue.clone(),
            Arc::clone(&registry),
        );
        let router = build_app_router(state.clone(), &config);

        Self {
            router,
            state,
            tasks,
            styles,
            queue,
            registry,
        }
    }

    /// A worker over this app's store, queue and registry.
    pub fn worker(&self, transformer: Arc<dyn Transformer>) -> Worker {
        self.worker_with_window(transformer, Duration::from_secs(60))
    }

    pub fn worker_with_window(
        &self,
        transformer: Arc<dyn Transformer>,
        max_time_from_start: Duration,
    ) -> Worker {
        Worker::new(
            self.tasks.clone(),
            self.queue.clone(),
            transformer,
            Arc::clone(&self.registry),
            WorkerSettings {
                max_time_from_start,
                api_key: "test-key".to_string(),
                poll_interval: Duration::from_millis(20),
            },
        )
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

// ---------------------------------------------------------------------------
// Mock transformer
// ---------------------------------------------------------------------------

/// Records every call and replies with queued outcomes (success by default).
///
/// With [`MockTransformer::gated`], each call signals `entered` and then
/// waits for `release`, so a test can act while a task is `PROCESSING`.
#[derive(Default)]
pub struct MockTransformer {
    calls: AtomicUsize,
    requests: Mutex<Vec<TransformRequest>>,
    outcomes: Mutex<VecDeque<TransformOutcome>>,
    styles: Mutex<Vec<String>>,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl MockTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the transformer plus `(entered, release)` notifiers.
    pub fn gated() -> (Self, Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let mock = Self {
            gate: Some((Arc::clone(&entered), Arc::clone(&release))),
            ..Self::default()
        };
        (mock, entered, release)
    }

    pub async fn push_outcome(&self, outcome: TransformOutcome) {
        self.outcomes.lock().await.push_back(outcome);
    }

    pub async fn set_styles(&self, styles: &[&str]) {
        *self.styles.lock().await = styles.iter().map(|s| s.to_string()).collect();
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn requests(&self) -> Vec<TransformRequest> {
        self.requests.lock().await.clone()
    }
}

pub fn success(image: &str) -> TransformOutcome {
    TransformOutcome::Completed(TransformResponse {
        processed_image: image.to_string(),
        processing_time: 0.1,
        style: "mosaic".to_string(),
    })
}

#[async_trait]
impl Transformer for MockTransformer {
    async fn transform(&self, request: TransformRequest) -> TransformOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request);
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }
        self.outcomes
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| success("cmVzdWx0"))
    }

    async fn styles(&self) -> Result<Vec<String>, TransformerError> {
        Ok(self.styles.lock().await.clone())
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Sign a token the way the identity service would.
pub fn token(user_id: DbId) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = serde_json::json!({
        "sub": user_id,
        "role": "user",
        "iat": now,
        "exp": now + 15 * 60,
    });
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

/// A small, valid PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// One part of a multipart form.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// `POST /api/v1/tasks` with a PNG image and the given style/intensity.
pub fn submit_request(user_id: DbId, image: &[u8], style: &str, intensity: &str) -> Request<Body> {
    let body = multipart_body(&[
        Part::File {
            name: "image",
            file_name: "photo.png",
            content_type: "image/png",
            bytes: image,
        },
        Part::Text("style", style),
        Part::Text("intensity", intensity),
    ]);
    multipart_request(Some(user_id), body)
}

pub fn multipart_request(user_id: Option<DbId>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/tasks")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(user_id) = user_id {
        builder = builder.header("authorization", format!("Bearer {}", token(user_id)));
    }
    builder.body(Body::from(body)).unwrap()
}

pub fn authed(method: &str, uri: &str, user_id: DbId) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token(user_id)))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Channel helpers
// ---------------------------------------------------------------------------

/// Drain everything currently queued on a registry receiver.
///
/// Returns the decoded events and whether a Close frame was seen.
pub fn drain_events(rx: &mut mpsc::UnboundedReceiver<Message>) -> (Vec<TaskEvent>, bool) {
    let mut events = Vec::new();
    let mut closed = false;
    while let Ok(msg) = rx.try_recv() {
        match msg {
            Message::Text(text) => events.push(serde_json::from_str(text.as_str()).unwrap()),
            Message::Close(_) => closed = true,
            _ => {}
        }
    }
    (events, closed)
}
