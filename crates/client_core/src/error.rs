use thiserror::Error;

/// Local, pre-network rejection of a draft.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid amount")]
    InvalidAmount,
    #[error("invalid close date")]
    InvalidCloseDate,
}

/// Failure of a single remote call, or of preparing one.
///
/// `Display` is the message shown to the user.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Could not connect to the server. Make sure the API is running at {base_url}")]
    Connectivity {
        base_url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{}", http_message(*status, body))]
    Http { status: u16, body: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("unexpected response from server: {0}")]
    Decode(String),
    #[error("failed to encode request: {0}")]
    Encode(String),
}

impl ClientError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn http_message(status: u16, body: &str) -> String {
    if body.trim().is_empty() {
        format!("request failed (HTTP {status})")
    } else {
        body.to_string()
    }
}
