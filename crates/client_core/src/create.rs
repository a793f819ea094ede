use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use shared::{
    domain::{Account, Opportunity, StageName},
    protocol::{ACCOUNTS_PATH, OPPORTUNITIES_PATH, STAGE_NAMES_PATH},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    draft::{DraftField, OpportunityDraft},
    error::ClientError,
    transport::RemoteTransport,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionsStatus {
    Loading,
    Ready,
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitStatus {
    Idle,
    Submitting,
    Success,
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateEvent {
    Options(OptionsStatus),
    Submit(SubmitStatus),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateSnapshot {
    pub options_status: OptionsStatus,
    pub stage_names: Vec<StageName>,
    pub accounts: Vec<Account>,
    pub draft: OpportunityDraft,
    pub submit_status: SubmitStatus,
    /// Record returned by the last successful submission, when the backend
    /// sent one back.
    pub created: Option<Opportunity>,
}

impl CreateSnapshot {
    /// The form is only shown once both option lists are loaded.
    pub fn form_ready(&self) -> bool {
        self.options_status == OptionsStatus::Ready
    }

    pub fn options_error(&self) -> Option<&str> {
        match &self.options_status {
            OptionsStatus::Error { message } => Some(message),
            _ => None,
        }
    }

    pub fn submit_error(&self) -> Option<&str> {
        match &self.submit_status {
            SubmitStatus::Error { message } => Some(message),
            _ => None,
        }
    }
}

struct CreateState {
    options_status: OptionsStatus,
    stage_names: Vec<StageName>,
    accounts: Vec<Account>,
    options_generation: u64,
    draft: OpportunityDraft,
    submit_status: SubmitStatus,
    created: Option<Opportunity>,
}

impl CreateState {
    fn snapshot(&self) -> CreateSnapshot {
        CreateSnapshot {
            options_status: self.options_status.clone(),
            stage_names: self.stage_names.clone(),
            accounts: self.accounts.clone(),
            draft: self.draft.clone(),
            submit_status: self.submit_status.clone(),
            created: self.created.clone(),
        }
    }
}

/// Drives the create form: loads stage and account choices, holds the draft
/// and submits it.
pub struct CreateSubmissionController {
    transport: Arc<dyn RemoteTransport>,
    inner: Mutex<CreateState>,
    events: broadcast::Sender<CreateEvent>,
}

impl CreateSubmissionController {
    pub fn new(transport: Arc<dyn RemoteTransport>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            transport,
            inner: Mutex::new(CreateState {
                options_status: OptionsStatus::Loading,
                stage_names: Vec::new(),
                accounts: Vec::new(),
                options_generation: 0,
                draft: OpportunityDraft::default(),
                submit_status: SubmitStatus::Idle,
                created: None,
            }),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CreateEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> CreateSnapshot {
        self.inner.lock().await.snapshot()
    }

    /// Fetches stage names and accounts concurrently. Safe to call again to
    /// reload; only the latest call's result is applied.
    pub async fn load_options(&self) -> CreateSnapshot {
        let generation = {
            let mut guard = self.inner.lock().await;
            guard.options_generation += 1;
            guard.options_status = OptionsStatus::Loading;
            let _ = self
                .events
                .send(CreateEvent::Options(OptionsStatus::Loading));
            guard.options_generation
        };

        info!(generation, "loading form options");
        let (stage_names, accounts) = tokio::join!(
            self.transport.request(Method::GET, STAGE_NAMES_PATH, None),
            self.transport.request(Method::GET, ACCOUNTS_PATH, None),
        );
        let outcome = resolve_options(stage_names, accounts);

        let mut guard = self.inner.lock().await;
        if guard.options_generation != generation {
            debug!(
                generation,
                latest = guard.options_generation,
                "discarding stale form options"
            );
            return guard.snapshot();
        }

        let options_status = match outcome {
            Ok((stage_names, accounts)) => {
                info!(
                    stage_names = stage_names.len(),
                    accounts = accounts.len(),
                    "form options ready"
                );
                guard.stage_names = stage_names;
                guard.accounts = accounts;
                OptionsStatus::Ready
            }
            Err(message) => {
                warn!(error = %message, "failed to load form options");
                OptionsStatus::Error { message }
            }
        };
        guard.options_status = options_status;
        let _ = self
            .events
            .send(CreateEvent::Options(guard.options_status.clone()));
        guard.snapshot()
    }

    /// Plain assignment; validation waits for [`Self::submit`].
    pub async fn update_field(&self, field: DraftField, value: impl Into<String>) {
        self.inner.lock().await.draft.set(field, value);
    }

    /// Validates and posts the current draft. Ignored while options are not
    /// ready or another submission is in flight.
    pub async fn submit(&self) -> SubmitStatus {
        let draft = {
            let mut guard = self.inner.lock().await;
            if guard.options_status != OptionsStatus::Ready {
                debug!("submit ignored: form options not ready");
                return guard.submit_status.clone();
            }
            if guard.submit_status == SubmitStatus::Submitting {
                debug!("submit ignored: submission already in flight");
                return guard.submit_status.clone();
            }
            guard.submit_status = SubmitStatus::Submitting;
            guard.created = None;
            let _ = self
                .events
                .send(CreateEvent::Submit(SubmitStatus::Submitting));
            guard.draft.clone()
        };

        let result = self.post_draft(&draft).await;

        let mut guard = self.inner.lock().await;
        let submit_status = match result {
            Ok(created) => {
                let created = serde_json::from_value::<Opportunity>(created).ok();
                info!(
                    id = created.as_ref().map(|opp| opp.id.as_str()),
                    "opportunity created"
                );
                guard.created = created;
                guard.draft = OpportunityDraft::default();
                SubmitStatus::Success
            }
            Err(err) => {
                warn!(error = %err, status = ?err.status(), "opportunity submission failed");
                SubmitStatus::Error {
                    message: err.to_string(),
                }
            }
        };
        guard.submit_status = submit_status;
        let _ = self
            .events
            .send(CreateEvent::Submit(guard.submit_status.clone()));
        guard.submit_status.clone()
    }

    async fn post_draft(&self, draft: &OpportunityDraft) -> Result<Value, ClientError> {
        let request = draft.to_request()?;
        let body = serde_json::to_value(&request)
            .map_err(|err| ClientError::Encode(err.to_string()))?;
        self.transport
            .request(Method::POST, OPPORTUNITIES_PATH, Some(body))
            .await
    }
}

fn resolve_options(
    stage_names: Result<Value, ClientError>,
    accounts: Result<Value, ClientError>,
) -> Result<(Vec<StageName>, Vec<Account>), String> {
    let stage_names = stage_names
        .and_then(|value| {
            serde_json::from_value::<Vec<StageName>>(value)
                .map_err(|err| ClientError::Decode(err.to_string()))
        })
        .map_err(|err| format!("Error fetching stage names: {err}"))?;
    let accounts = accounts
        .map(accounts_or_empty)
        .map_err(|err| format!("Error fetching accounts: {err}"))?;
    Ok((stage_names, accounts))
}

/// Anything other than a JSON array counts as "no accounts". Array entries
/// without the `Id`/`Name` shape are skipped.
fn accounts_or_empty(value: Value) -> Vec<Account> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            warn!(response = %other, "accounts response is not a list; showing no accounts");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Account>(item) {
            Ok(account) => Some(account),
            Err(err) => {
                warn!(error = %err, "skipping malformed account entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/create_tests.rs"]
mod tests;
