//! Fake backends shared by the controller and transport tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    Router,
};
use serde_json::{json, Value};
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

use crate::{error::ClientError, transport::RemoteTransport};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct MockResponse {
    status: StatusCode,
    body: String,
}

impl MockResponse {
    pub fn json(status: StatusCode, value: Value) -> Self {
        Self {
            status,
            body: value.to_string(),
        }
    }

    pub fn text(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

/// Axum server that answers from a `(method, path)` table and records every
/// request it sees.
#[derive(Clone, Default)]
pub struct MockBackend {
    responses: Arc<Mutex<HashMap<(Method, String), MockResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockBackend {
    pub async fn respond(&self, method: Method, path: &str, response: MockResponse) {
        self.responses
            .lock()
            .await
            .insert((method, path.to_string()), response);
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn spawn(&self) -> anyhow::Result<String> {
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = Router::new()
            .fallback(handle_mock_request)
            .with_state(self.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(format!("http://{addr}"))
    }
}

async fn handle_mock_request(
    State(backend): State<MockBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let path = uri.path().to_string();
    let body = if body.is_empty() {
        None
    } else {
        serde_json::from_slice(&body).ok()
    };
    backend.requests.lock().await.push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        headers,
        body,
    });

    match backend.responses.lock().await.get(&(method, path)).cloned() {
        Some(response) => (response.status, response.body),
        None => (StatusCode::NOT_FOUND, String::new()),
    }
}

/// Base URL of a port nothing listens on.
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}

type ScriptedReply = Result<Value, ClientError>;

/// Transport whose replies are released by the test, one oneshot per call,
/// so completion order can differ from issue order.
#[derive(Default)]
pub struct ScriptedTransport {
    pending: Mutex<HashMap<String, VecDeque<oneshot::Receiver<ScriptedReply>>>>,
    calls: Mutex<Vec<(Method, String)>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn script(&self, path: &str) -> oneshot::Sender<ScriptedReply> {
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .await
            .entry(path.to_string())
            .or_default()
            .push_back(rx);
        tx
    }

    pub async fn calls(&self) -> Vec<(Method, String)> {
        self.calls.lock().await.clone()
    }

    pub async fn wait_for_calls(&self, count: usize) {
        for _ in 0..200 {
            if self.calls.lock().await.len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("timed out waiting for {count} transport calls");
    }
}

#[async_trait]
impl RemoteTransport for ScriptedTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        _body: Option<Value>,
    ) -> Result<Value, ClientError> {
        self.calls.lock().await.push((method, path.to_string()));
        let reply = {
            let mut pending = self.pending.lock().await;
            pending.get_mut(path).and_then(VecDeque::pop_front)
        };
        match reply {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ClientError::Decode("scripted reply dropped".into()))),
            None => Err(ClientError::Http {
                status: 404,
                body: format!("no scripted reply for {path}"),
            }),
        }
    }
}

pub fn opportunity_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "amount": 25000.0,
        "stageName": "Prospecting",
        "probability": 10,
        "description": null,
        "createdDate": "2024-01-01T00:00:00Z",
        "lastModifiedDate": "2024-01-02T00:00:00Z",
        "accountId": "001A",
        "accountName": "Acme Corp",
        "ownerId": "005X",
        "ownerName": "Dana Reyes"
    })
}
