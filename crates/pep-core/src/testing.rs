//! Scripted transport used by unit tests

use crate::client::{DecisionTransport, Error, TransportResponse};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

type Script = Box<dyn Fn() -> Result<TransportResponse, Error> + Send + Sync>;

pub(crate) struct ScriptedTransport {
    script: Script,
    calls: AtomicUsize,
    urls: Mutex<Vec<Url>>,
}

impl ScriptedTransport {
    pub fn new(script: impl Fn() -> Result<TransportResponse, Error> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        })
    }

    pub fn respond(status: u16, body: &'static str) -> Arc<Self> {
        Self::new(move || Ok(TransportResponse::new(status, body)))
    }

    pub fn decision(decision: &str) -> Arc<Self> {
        let body = format!(r#"{{"authorization_decision":"{decision}"}}"#);
        Self::new(move || Ok(TransportResponse::new(200, body.clone())))
    }

    pub fn permit() -> Arc<Self> {
        Self::decision("Permit")
    }

    pub fn unreachable() -> Arc<Self> {
        Self::new(|| Err(Error::Send("connection refused".into())))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_url(&self) -> Option<Url> {
        self.urls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl DecisionTransport for ScriptedTransport {
    async fn send(&self, url: Url) -> Result<TransportResponse, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url);
        (self.script)()
    }
}
