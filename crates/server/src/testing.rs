//! Router fixtures.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use tailr_core::config::ClearScope;
use tailr_core::{ActorSettings, Error, Gateway, Generator, MemoryStore};
use tokio::sync::{Notify, Semaphore};
use tower::ServiceExt;

use crate::handler::{AppState, build_router};

/// Appends the latest edit as an HTML comment, optionally waiting for a permit.
#[derive(Default)]
pub struct EchoGenerator {
    gate: Option<Semaphore>,
    pub started: Notify,
    fail: Option<u16>,
}

impl EchoGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self { gate: Some(Semaphore::new(0)), ..Self::new() }
    }

    pub fn failing(status: u16) -> Self {
        Self { fail: Some(status), ..Self::new() }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }
}

#[async_trait]
impl Generator for EchoGenerator {
    async fn generate(&self, base_document: &str, _page: &str, history: &[String]) -> Result<String, Error> {
        self.started.notify_one();
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.map_err(|_| Error::InvalidInput("gate closed".into()))?;
        }
        if let Some(status) = self.fail {
            return Err(Error::Generation { status: Some(status), message: "backend unavailable".into() });
        }
        let latest = history.last().map(String::as_str).unwrap_or_default();
        Ok(format!("{base_document}<!-- {latest} -->"))
    }
}

pub struct App {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub generator: Arc<EchoGenerator>,
}

pub fn app(generator: EchoGenerator) -> App {
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(generator);
    let settings = ActorSettings { generation_timeout: Duration::from_secs(5), clear_scope: ClearScope::User };
    let gateway = Gateway::new(store.clone(), store.clone(), generator.clone(), settings);
    let router = build_router(AppState { gateway, retry_after: Duration::from_millis(1200) });
    App { router, store, generator }
}

pub fn get(uri: &str, uid: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(uid) = uid {
        builder = builder.header("cookie", format!("uid={uid}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, uid: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(uid) = uid {
        builder = builder.header("cookie", format!("uid={uid}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> (Response<Body>, String) {
    let response = router.clone().oneshot(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = body.collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    (Response::from_parts(parts, Body::empty()), text)
}
