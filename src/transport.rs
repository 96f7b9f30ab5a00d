//! Transport layer between the client and the notes service.
//!
//! [`NoteTransport`] is the seam the rest of the crate talks through. Every
//! failure, whatever its origin, is normalized into a [`TransportError`] so the
//! cache and the mutation orchestrator only ever deal with one error shape.

use crate::api::{CreateNoteInput, ErrorResponse, Note, NoteId, NotesResponse, UpdateNoteInput};
use futures::future::BoxFuture;

pub mod http;
pub mod memory;

pub use http::HttpTransport;
pub use memory::MemoryTransport;

/// Message shown when no response was received at all.
pub const NETWORK_ERROR_MESSAGE: &str = "Network Error";

/// Future returned by every [`NoteTransport`] operation.
pub type TransportFuture<T> = BoxFuture<'static, Result<T, TransportError>>;

/// Normalized failure of a transport call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// No response was received (connection refused, DNS failure, timeout, ...).
    #[error("Network error: {0}")]
    Network(String),
    /// The service answered with a non-2xx status.
    #[error("Request failed with status code {status}")]
    Application {
        /// HTTP status code.
        status: u16,
        /// `message` field of the error body, if any.
        message: Option<String>,
        /// `detail` field of the error body, if any.
        detail: Option<String>,
    },
    /// Anything else: undecodable bodies, contract violations.
    #[error("{0}")]
    Unknown(String),
}

impl TransportError {
    /// Builds an application error from a status code and the raw response body.
    ///
    /// The body is decoded as an [`ErrorResponse`] when possible; an undecodable
    /// body simply yields no `message` or `detail`.
    pub fn from_status(status: u16, body: &str) -> Self {
        let body: ErrorResponse = serde_json::from_str(body).unwrap_or_default();
        TransportError::Application {
            status,
            message: body.message,
            detail: body.detail,
        }
    }

    /// The user-facing message of this error.
    ///
    /// For application errors the precedence is the body's `message`, then its
    /// `detail`, then a generic status line. Network errors always yield
    /// [`NETWORK_ERROR_MESSAGE`].
    pub fn message(&self) -> String {
        match self {
            TransportError::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
            TransportError::Application {
                status,
                message,
                detail,
            } => message
                .as_deref()
                .filter(|m| !m.is_empty())
                .or_else(|| detail.as_deref().filter(|d| !d.is_empty()))
                .map(str::to_string)
                .unwrap_or_else(|| format!("Request failed with status code {status}")),
            TransportError::Unknown(message) => message.clone(),
        }
    }

    /// Returns the HTTP status of an application error.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Application { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Unknown(format!("Invalid response body: {err}"))
    }
}

/// Trait for talking to the notes service.
///
/// Implementations must be cheap to call from any task: each operation returns
/// an owned `'static` future so the cache can drive it from a spawned task that
/// outlives the caller.
pub trait NoteTransport: Send + Sync {
    /// Fetches one page of notes.
    ///
    /// # Arguments
    /// * `page` - 1-based page number
    /// * `limit` - Page size
    fn list_notes(&self, page: u32, limit: u32) -> TransportFuture<NotesResponse>;

    /// Fetches a single note.
    fn get_note(&self, id: &NoteId) -> TransportFuture<Note>;

    /// Creates a note and returns it as stored by the server.
    fn create_note(&self, input: CreateNoteInput) -> TransportFuture<Note>;

    /// Applies a partial update and returns the updated note.
    fn update_note(&self, id: &NoteId, input: UpdateNoteInput) -> TransportFuture<Note>;

    /// Deletes a note and returns the server's confirmation message.
    fn delete_note(&self, id: &NoteId) -> TransportFuture<String>;
}
