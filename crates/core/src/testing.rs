//! Scripted collaborators shared by the actor and gateway tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, Semaphore};

use crate::Error;
use crate::actor::{ActorContext, ActorSettings};
use crate::cache::{KvStore, MemoryStore};
use crate::config::ClearScope;
use crate::generate::Generator;

type Reply = dyn Fn(&str, &[String]) -> Result<String, Error> + Send + Sync;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateCall {
    pub base_document: String,
    pub page: String,
    pub history: Vec<String>,
}

/// Generator whose replies are computed by a closure, optionally held until
/// the test releases them.
pub struct ScriptedGenerator {
    reply: Box<Reply>,
    calls: Mutex<Vec<GenerateCall>>,
    gate: Option<Semaphore>,
    pub started: Notify,
}

impl ScriptedGenerator {
    pub fn new(reply: impl Fn(&str, &[String]) -> Result<String, Error> + Send + Sync + 'static) -> Self {
        Self { reply: Box::new(reply), calls: Mutex::new(Vec::new()), gate: None, started: Notify::new() }
    }

    /// Always answers with `document`.
    pub fn returning(document: &str) -> Self {
        let document = document.to_string();
        Self::new(move |_, _| Ok(document.clone()))
    }

    /// Always fails like a backend answering `status`.
    pub fn failing(status: u16, message: &str) -> Self {
        let message = message.to_string();
        Self::new(move |_, _| Err(Error::Generation { status: Some(status), message: message.clone() }))
    }

    /// Hold every call until [`ScriptedGenerator::release`] is called.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> Vec<GenerateCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, base_document: &str, page: &str, history: &[String]) -> Result<String, Error> {
        self.calls.lock().unwrap().push(GenerateCall {
            base_document: base_document.to_string(),
            page: page.to_string(),
            history: history.to_vec(),
        });
        self.started.notify_one();

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        (self.reply)(base_document, history)
    }
}

/// Key-value store that rejects writes to one key.
pub struct FlakyStore {
    pub inner: MemoryStore,
    fail_on: String,
}

impl FlakyStore {
    pub fn failing_on(key: String) -> Self {
        Self { inner: MemoryStore::new(), fail_on: key }
    }
}

#[async_trait]
impl KvStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), Error> {
        if key == self.fail_on {
            return Err(Error::Database(tokio_rusqlite::Error::ConnectionClosed));
        }
        self.inner.put(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.inner.delete(key).await
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub generator: Arc<ScriptedGenerator>,
    pub context: Arc<ActorContext>,
}

pub fn settings() -> ActorSettings {
    ActorSettings { generation_timeout: Duration::from_secs(5), clear_scope: ClearScope::User }
}

pub fn harness(generator: ScriptedGenerator) -> Harness {
    harness_with(generator, settings())
}

pub fn harness_with(generator: ScriptedGenerator, settings: ActorSettings) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(generator);
    let context = Arc::new(ActorContext::new(store.clone(), store.clone(), generator.clone(), settings));
    Harness { store, generator, context }
}
