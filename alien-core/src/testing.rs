//! Testing utilities for the narrative engine.
//!
//! This module provides tools for integration testing:
//! - `MockProvider` for deterministic turns without API calls
//! - `StubServer` for exercising the real HTTP path against a local socket

use crate::completion::CompletionProvider;
use crate::session::Credential;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Notify, Semaphore};

/// Reply used once the script runs out.
pub const EXHAUSTED_REPLY: &str = "The console has no more scripted responses.";

/// A provider that returns scripted results in order.
///
/// Clones share the script, the captured requests and the hold gate, so a
/// test can keep one handle while the engine owns another.
#[derive(Clone, Default)]
pub struct MockProvider {
    inner: Arc<MockInner>,
}

#[derive(Default)]
struct MockInner {
    script: Mutex<VecDeque<Result<String, groq::Error>>>,
    requests: Mutex<Vec<groq::Request>>,
    calls: AtomicUsize,
    started: Notify,
    gate: Option<Semaphore>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose calls block until [`MockProvider::release`] is called.
    pub fn held() -> Self {
        Self {
            inner: Arc::new(MockInner {
                gate: Some(Semaphore::new(0)),
                ..MockInner::default()
            }),
        }
    }

    /// Queue a successful reply.
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()));
        self
    }

    /// Queue a failure.
    pub fn fail(self, error: groq::Error) -> Self {
        self.push(Err(error));
        self
    }

    pub fn push(&self, result: Result<String, groq::Error>) {
        self.inner
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(result);
    }

    /// Let one held call proceed.
    pub fn release(&self) {
        if let Some(gate) = &self.inner.gate {
            gate.add_permits(1);
        }
    }

    /// Wait until a call has started. Returns immediately if one already
    /// started since the last wait.
    pub async fn started(&self) {
        self.inner.started.notified().await;
    }

    /// Number of `complete` calls made so far.
    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<groq::Request> {
        self.inner
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_request(&self) -> Option<groq::Request> {
        self.requests().pop()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(
        &self,
        request: groq::Request,
        _credential: &Credential,
    ) -> Result<String, groq::Error> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        self.inner.started.notify_one();

        if let Some(gate) = &self.inner.gate {
            gate.acquire()
                .await
                .map_err(|e| groq::Error::Network(e.to_string()))?
                .forget();
        }

        self.inner
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Ok(EXHAUSTED_REPLY.to_string()))
    }
}

/// A request captured by [`StubServer`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request line and headers.
    pub head: String,
    pub body: String,
}

impl RecordedRequest {
    /// Look up a header value, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim())
        })
    }

    /// The request line, e.g. `POST /v1/chat/completions HTTP/1.1`.
    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// A local HTTP server that answers exactly one request with a canned
/// status and body, then records what it received.
pub struct StubServer {
    addr: SocketAddr,
    received: oneshot::Receiver<RecordedRequest>,
}

impl StubServer {
    /// Start a server answering with `status` (e.g. `"200 OK"`) and `body`.
    pub async fn respond(status: &str, body: impl Into<String>) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let status = status.to_string();
        let body = body.into();
        let (tx, received) = oneshot::channel();

        tokio::spawn(async move {
            if let Err(err) = serve_one(listener, &status, &body, tx).await {
                tracing::warn!(error = %err, "stub server failed");
            }
        });

        Ok(Self { addr, received })
    }

    /// Base URL to hand to a client, ending in `/v1`.
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Wait for the recorded request. `None` if the server never got one.
    pub async fn recorded(self) -> Option<RecordedRequest> {
        self.received.await.ok()
    }
}

async fn serve_one(
    listener: TcpListener,
    status: &str,
    body: &str,
    tx: oneshot::Sender<RecordedRequest>,
) -> std::io::Result<()> {
    let (mut socket, _) = listener.accept().await?;
    let mut buf = Vec::with_capacity(16 * 1024);
    let mut chunk = [0u8; 4096];

    let recorded = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break split_request(&buf);
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(recorded) = complete_request(&buf) {
            break Some(recorded);
        }
    };

    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await.ok();

    if let Some(recorded) = recorded {
        tx.send(recorded).ok();
    }
    Ok(())
}

/// The request in `buf` once the headers and the declared body are in.
fn complete_request(buf: &[u8]) -> Option<RecordedRequest> {
    let recorded = split_request(buf)?;
    let length = recorded
        .header("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    (recorded.body.len() >= length).then_some(recorded)
}

fn split_request(buf: &[u8]) -> Option<RecordedRequest> {
    let text = String::from_utf8_lossy(buf);
    let (head, body) = text.split_once("\r\n\r\n")?;
    Some(RecordedRequest {
        head: head.to_string(),
        body: body.to_string(),
    })
}
