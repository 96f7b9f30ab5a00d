//! Wire types of the notes REST service.
//!
//! These mirror the JSON bodies exchanged with the backend. The client never
//! creates a [`Note`] itself: notes are owned by the server and the client only
//! holds read-only copies of them.

use chrono::{DateTime, Utc};
use derive_more::{AsRef, Display, From};
use serde::{Deserialize, Serialize};

/// Server-assigned identifier of a note.
///
/// The value is opaque to the client and is only ever echoed back in URLs.
#[derive(
    Serialize, Deserialize, Debug, Hash, Default, PartialEq, Eq, PartialOrd, Ord, Clone, AsRef, Display, From,
)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn new<T: Into<String>>(id: T) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A note as returned by the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Note {
    /// Identifier assigned by the server on creation.
    pub id: NoteId,
    /// Title of the note.
    pub title: String,
    /// Body of the note.
    pub content: String,
    /// Whether the note is published.
    #[serde(default)]
    pub is_published: bool,
    /// Creation time, assigned by the server.
    pub created_at: DateTime<Utc>,
    /// Time of the last update, assigned by the server.
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST notes`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateNoteInput {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
}

impl CreateNoteInput {
    pub fn new<T: Into<String>, C: Into<String>>(title: T, content: C) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            is_published: None,
        }
    }

    pub fn published(mut self, is_published: bool) -> Self {
        self.is_published = Some(is_published);
        self
    }
}

/// Body of `PATCH notes/{id}`. Absent fields are left untouched by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateNoteInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
}

impl UpdateNoteInput {
    pub fn title<T: Into<String>>(mut self, title: T) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content<T: Into<String>>(mut self, content: T) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn published(mut self, is_published: bool) -> Self {
        self.is_published = Some(is_published);
        self
    }
}

/// Response of `GET notes?page=&limit=`.
///
/// `count` is the number of notes across all pages, not the length of `notes`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotesResponse {
    pub status: String,
    pub count: u64,
    pub notes: Vec<Note>,
}

/// Payload wrapper of [`NoteResponse`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoteData {
    pub note: Note,
}

/// Response of the single-note endpoints (create, update, get one).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoteResponse {
    pub status: String,
    pub data: NoteData,
}

/// Response of `DELETE notes/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenericResponse {
    pub status: String,
    pub message: String,
}

/// Error body sent by the service alongside a non-2xx status.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::{assert_ser_tokens, assert_tokens, Token};

    #[test]
    fn test_note_id_is_transparent() {
        let id = NoteId::new("a1b2");
        assert_tokens(&id, &[Token::Str("a1b2")]);
        assert_eq!(id.to_string(), "a1b2");
    }

    #[test]
    fn test_create_input_omits_unset_flag() {
        let input = CreateNoteInput::new("Groceries", "Milk");
        assert_ser_tokens(
            &input,
            &[
                Token::Struct {
                    name: "CreateNoteInput",
                    len: 2,
                },
                Token::Str("title"),
                Token::Str("Groceries"),
                Token::Str("content"),
                Token::Str("Milk"),
                Token::StructEnd,
            ],
        );
    }

    #[test]
    fn test_update_input_is_partial() {
        let input = UpdateNoteInput::default().published(true);
        assert_ser_tokens(
            &input,
            &[
                Token::Struct {
                    name: "UpdateNoteInput",
                    len: 1,
                },
                Token::Str("is_published"),
                Token::Some,
                Token::Bool(true),
                Token::StructEnd,
            ],
        );
    }

    #[test]
    fn test_notes_response_from_json() {
        let body = r#"{
            "status": "success",
            "count": 25,
            "notes": [{
                "id": "n-1",
                "title": "First",
                "content": "Body",
                "created_at": "2024-05-01T10:00:00Z",
                "updated_at": "2024-05-01T10:00:00Z"
            }]
        }"#;
        let response: NotesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.count, 25);
        assert_eq!(response.notes.len(), 1);
        assert_eq!(response.notes[0].id, NoteId::from("n-1"));
        assert!(!response.notes[0].is_published);
    }

    #[test]
    fn test_error_response_tolerates_missing_fields() {
        let error: ErrorResponse = serde_json::from_str(r#"{"detail":"Bad page"}"#).unwrap();
        assert_eq!(error.status, "");
        assert_eq!(error.message, None);
        assert_eq!(error.detail.as_deref(), Some("Bad page"));
    }
}
