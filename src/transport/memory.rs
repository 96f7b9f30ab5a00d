//! In-process implementation of [`NoteTransport`].
//!
//! [`MemoryTransport`] keeps notes in memory and answers exactly like the REST
//! service would, including its `404 Note not found` errors. It also records
//! how often each operation was called and can hold responses back or fail them
//! on demand, which makes it the backend of choice for tests and demos.

use super::{NoteTransport, TransportError, TransportFuture};
use crate::api::{CreateNoteInput, Note, NoteId, NotesResponse, UpdateNoteInput};
use chrono::Utc;
use futures::future;
use parking_lot::Mutex;
use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};
use tokio::sync::watch;

const NOT_FOUND_MESSAGE: &str = "Note not found";

/// The operations of the notes service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Default)]
struct MemoryState {
    notes: Vec<Note>,
    next_id: u64,
    server_page_size: Option<u32>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    state: Mutex<MemoryState>,
    calls: Mutex<HashMap<Operation, usize>>,
    failures: Mutex<HashMap<Operation, VecDeque<TransportError>>>,
    gates: Mutex<HashMap<Operation, watch::Sender<bool>>>,
}

/// A notes service living in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport(Arc<MemoryInner>);

impl MemoryTransport {
    /// Creates an empty service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a service holding `count` notes titled `Note 1`, `Note 2`, ...
    pub fn with_notes(count: usize) -> Self {
        let transport = Self::new();
        for i in 1..=count {
            transport.seed(format!("Note {i}"), format!("Content {i}"));
        }
        transport
    }

    /// Makes the service ignore the requested `limit` and page with `page_size` instead.
    pub fn with_server_page_size(self, page_size: u32) -> Self {
        self.0.state.lock().server_page_size = Some(page_size);
        self
    }

    /// Stores a note directly, bypassing call accounting.
    pub fn seed<T: Into<String>, C: Into<String>>(&self, title: T, content: C) -> Note {
        self.0.state.lock().insert(CreateNoteInput::new(title, content))
    }

    /// Returns every stored note in list order.
    pub fn notes(&self) -> Vec<Note> {
        self.0.state.lock().notes.clone()
    }

    /// Returns how many times `operation` has been called.
    pub fn calls(&self, operation: Operation) -> usize {
        self.0.calls.lock().get(&operation).copied().unwrap_or_default()
    }

    /// Makes the next call of `operation` fail with `error`.
    pub fn fail_next(&self, operation: Operation, error: TransportError) {
        self.0
            .failures
            .lock()
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Holds back the responses of `operation` until [`release`](Self::release) is called.
    ///
    /// Held calls are answered from the state at the time they were made.
    pub fn hold(&self, operation: Operation) {
        self.0
            .gates
            .lock()
            .entry(operation)
            .or_insert_with(|| watch::channel(true).0)
            .send_replace(false);
    }

    /// Lets held responses of `operation` through.
    pub fn release(&self, operation: Operation) {
        if let Some(gate) = self.0.gates.lock().get(&operation) {
            gate.send_replace(true);
        }
    }

    fn respond<T, F>(&self, operation: Operation, handler: F) -> TransportFuture<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut MemoryState) -> Result<T, TransportError>,
    {
        *self.0.calls.lock().entry(operation).or_default() += 1;

        let injected = self
            .0
            .failures
            .lock()
            .get_mut(&operation)
            .and_then(VecDeque::pop_front);
        let result = match injected {
            Some(err) => Err(err),
            None => handler(&mut self.0.state.lock()),
        };

        let gate = self.0.gates.lock().get(&operation).map(watch::Sender::subscribe);
        match gate {
            Some(mut gate) => Box::pin(async move {
                let _ = gate.wait_for(|open| *open).await;
                result
            }),
            None => Box::pin(future::ready(result)),
        }
    }
}

fn not_found() -> TransportError {
    TransportError::Application {
        status: 404,
        message: Some(NOT_FOUND_MESSAGE.to_string()),
        detail: None,
    }
}

impl MemoryState {
    fn insert(&mut self, input: CreateNoteInput) -> Note {
        self.next_id += 1;
        let now = Utc::now();
        let note = Note {
            id: NoteId::new(format!("note-{}", self.next_id)),
            title: input.title,
            content: input.content,
            is_published: input.is_published.unwrap_or(false),
            created_at: now,
            updated_at: now,
        };
        self.notes.push(note.clone());
        note
    }

    fn position(&self, id: &NoteId) -> Result<usize, TransportError> {
        self.notes
            .iter()
            .position(|note| &note.id == id)
            .ok_or_else(not_found)
    }
}

impl NoteTransport for MemoryTransport {
    fn list_notes(&self, page: u32, limit: u32) -> TransportFuture<NotesResponse> {
        self.respond(Operation::List, |state| {
            let limit = state.server_page_size.unwrap_or(limit) as usize;
            let offset = (page.max(1) as usize - 1) * limit;
            let notes = state.notes.iter().skip(offset).take(limit).cloned().collect();
            Ok(NotesResponse {
                status: "success".to_string(),
                count: state.notes.len() as u64,
                notes,
            })
        })
    }

    fn get_note(&self, id: &NoteId) -> TransportFuture<Note> {
        let id = id.clone();
        self.respond(Operation::Get, move |state| {
            let index = state.position(&id)?;
            Ok(state.notes[index].clone())
        })
    }

    fn create_note(&self, input: CreateNoteInput) -> TransportFuture<Note> {
        self.respond(Operation::Create, move |state| Ok(state.insert(input)))
    }

    fn update_note(&self, id: &NoteId, input: UpdateNoteInput) -> TransportFuture<Note> {
        let id = id.clone();
        self.respond(Operation::Update, move |state| {
            let index = state.position(&id)?;
            let note = &mut state.notes[index];
            if let Some(title) = input.title {
                note.title = title;
            }
            if let Some(content) = input.content {
                note.content = content;
            }
            if let Some(is_published) = input.is_published {
                note.is_published = is_published;
            }
            note.updated_at = Utc::now();
            Ok(note.clone())
        })
    }

    fn delete_note(&self, id: &NoteId) -> TransportFuture<String> {
        let id = id.clone();
        self.respond(Operation::Delete, move |state| {
            let index = state.position(&id)?;
            state.notes.remove(index);
            Ok("Note deleted successfully".to_string())
        })
    }
}
