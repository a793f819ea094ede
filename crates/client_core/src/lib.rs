//! Client-side sync and submission workflow for the opportunity API.
//!
//! [`RemoteClient`] talks HTTP/JSON to the backend. [`ListSyncController`]
//! and [`CreateSubmissionController`] each own the state of one view and
//! turn every remote failure into a message stored in that state.

pub mod config;
mod create;
pub mod draft;
pub mod error;
mod list;
pub mod transport;

pub use config::{load_config, ClientConfig};
pub use create::{
    CreateEvent, CreateSnapshot, CreateSubmissionController, OptionsStatus, SubmitStatus,
};
pub use draft::{DraftField, OpportunityDraft};
pub use error::{ClientError, ValidationError};
pub use list::{ListSnapshot, ListStatus, ListSyncController};
pub use transport::{RemoteClient, RemoteTransport};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
