use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use shared::{domain::Opportunity, protocol::ListFilter};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{error::ClientError, transport::RemoteTransport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListStatus {
    Loading,
    Success,
    Error { message: String },
}

/// What the list view renders. `data` keeps the last successful result
/// while a newer fetch is loading or has failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot {
    pub status: ListStatus,
    pub filter: ListFilter,
    pub data: Vec<Opportunity>,
}

impl ListSnapshot {
    pub fn is_loading(&self) -> bool {
        self.status == ListStatus::Loading
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            ListStatus::Error { message } => Some(message),
            _ => None,
        }
    }
}

struct ListState {
    status: ListStatus,
    filter: ListFilter,
    data: Vec<Opportunity>,
    generation: u64,
}

impl ListState {
    fn snapshot(&self) -> ListSnapshot {
        ListSnapshot {
            status: self.status.clone(),
            filter: self.filter,
            data: self.data.clone(),
        }
    }
}

/// Keeps the opportunity list in sync with the backend for one view.
pub struct ListSyncController {
    transport: Arc<dyn RemoteTransport>,
    inner: Mutex<ListState>,
    events: broadcast::Sender<ListStatus>,
}

impl ListSyncController {
    pub fn new(transport: Arc<dyn RemoteTransport>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            transport,
            inner: Mutex::new(ListState {
                status: ListStatus::Loading,
                filter: ListFilter::All,
                data: Vec::new(),
                generation: 0,
            }),
            events,
        }
    }

    /// Every status transition, in order.
    pub fn subscribe(&self) -> broadcast::Receiver<ListStatus> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> ListSnapshot {
        self.inner.lock().await.snapshot()
    }

    /// Switches between all and new-only records. Always refetches, even if
    /// the flag did not change.
    pub async fn set_filter(&self, new_only: bool) -> ListSnapshot {
        self.inner.lock().await.filter = ListFilter::from_new_only(new_only);
        self.refetch().await
    }

    pub async fn retry(&self) -> ListSnapshot {
        self.refetch().await
    }

    pub async fn refetch(&self) -> ListSnapshot {
        let (generation, filter) = {
            let mut guard = self.inner.lock().await;
            guard.generation += 1;
            guard.status = ListStatus::Loading;
            let _ = self.events.send(ListStatus::Loading);
            (guard.generation, guard.filter)
        };

        let path = filter.path();
        info!(path, generation, "fetching opportunities");
        let result = self
            .transport
            .request(Method::GET, path, None)
            .await
            .and_then(decode_opportunities);

        let mut guard = self.inner.lock().await;
        if guard.generation != generation {
            debug!(
                path,
                generation,
                latest = guard.generation,
                "discarding stale opportunity list response"
            );
            return guard.snapshot();
        }

        let status = match result {
            Ok(data) => {
                info!(path, count = data.len(), "opportunities loaded");
                guard.data = data;
                ListStatus::Success
            }
            Err(err) => {
                warn!(path, error = %err, "failed to load opportunities");
                ListStatus::Error {
                    message: err.to_string(),
                }
            }
        };
        guard.status = status;
        let _ = self.events.send(guard.status.clone());
        guard.snapshot()
    }
}

fn decode_opportunities(value: Value) -> Result<Vec<Opportunity>, ClientError> {
    serde_json::from_value(value).map_err(|err| ClientError::Decode(err.to_string()))
}

#[cfg(test)]
#[path = "tests/list_tests.rs"]
mod tests;
