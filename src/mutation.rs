//! Create, update and delete with a uniform lifecycle.
//!
//! Every mutation goes through the same steps: refuse a duplicate submit,
//! validate, show the in-progress indicator, call the transport, then either
//! invalidate the note list and report success or report the failure. The
//! indicator is owned by a guard, so it is cleared on every exit path.

use crate::{
    api::{CreateNoteInput, Note, NoteId, UpdateNoteInput},
    cache::PageCache,
    notify::Notifier,
    transport::{NoteTransport, TransportError, TransportFuture},
    validate::{Validate, ValidationErrors},
};
use derive_more::Display;
use parking_lot::Mutex;
use std::{collections::HashSet, fmt, sync::Arc};
#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

pub const NOTE_CREATED_MESSAGE: &str = "Note created successfully";
pub const NOTE_UPDATED_MESSAGE: &str = "Note updated successfully";
pub const NOTE_DELETED_MESSAGE: &str = "Note deleted successfully";

/// A logical mutation. Two submits with the same key never run at the same time.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash)]
pub enum MutationKey {
    #[display("create")]
    Create,
    #[display("update of {_0}")]
    Update(NoteId),
    #[display("delete of {_0}")]
    Delete(NoteId),
}

/// Errors returned by [`Mutations`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    /// The draft was rejected locally; nothing was sent.
    #[error("Invalid input: {0}")]
    Invalid(#[from] ValidationErrors),
    /// The same mutation is still running.
    #[error("The {0} is already in progress")]
    InProgress(MutationKey),
    /// The service call failed. An error notification has already been emitted.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Default)]
struct MutationState {
    running: HashSet<MutationKey>,
    busy: usize,
}

struct MutationsInner {
    transport: Arc<dyn NoteTransport>,
    cache: PageCache,
    notifier: Notifier,
    state: Mutex<MutationState>,
}

/// Runs note mutations and keeps the note list in sync with their outcome.
#[derive(Clone)]
pub struct Mutations(Arc<MutationsInner>);

impl fmt::Debug for Mutations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutations")
            .field("state", &*self.0.state.lock())
            .finish()
    }
}

impl Mutations {
    pub fn new(transport: Arc<dyn NoteTransport>, cache: PageCache, notifier: Notifier) -> Self {
        Self(Arc::new(MutationsInner {
            transport,
            cache,
            notifier,
            state: Mutex::new(MutationState::default()),
        }))
    }

    /// Creates a note.
    pub async fn create(&self, input: CreateNoteInput) -> Result<Note, MutationError> {
        let transport = self.0.transport.clone();
        self.run(MutationKey::Create, input, NOTE_CREATED_MESSAGE, move |input| {
            transport.create_note(input)
        })
        .await
    }

    /// Updates the fields of note `id` that are set in `input`.
    pub async fn update(&self, id: &NoteId, input: UpdateNoteInput) -> Result<Note, MutationError> {
        let transport = self.0.transport.clone();
        let target = id.clone();
        self.run(
            MutationKey::Update(id.clone()),
            input,
            NOTE_UPDATED_MESSAGE,
            move |input| transport.update_note(&target, input),
        )
        .await
    }

    /// Deletes note `id`. Returns the service's confirmation message.
    pub async fn delete(&self, id: &NoteId) -> Result<String, MutationError> {
        let transport = self.0.transport.clone();
        let target = id.clone();
        self.run(
            MutationKey::Delete(id.clone()),
            (),
            NOTE_DELETED_MESSAGE,
            move |()| transport.delete_note(&target),
        )
        .await
    }

    /// Whether `key` is currently running.
    pub fn is_running(&self, key: &MutationKey) -> bool {
        self.0.state.lock().running.contains(key)
    }

    /// Whether any mutation is past validation and waiting on the service.
    pub fn is_busy(&self) -> bool {
        self.0.state.lock().busy > 0
    }

    async fn run<T, V, F>(
        &self,
        key: MutationKey,
        input: V,
        success_message: &str,
        request: F,
    ) -> Result<T, MutationError>
    where
        V: Validate,
        F: FnOnce(V) -> TransportFuture<T>,
    {
        let mut guard = self.begin(key)?;
        input.validate()?;

        guard.start();
        #[cfg(feature = "tracing")]
        let key = guard.key.clone();
        #[cfg(feature = "tracing")]
        debug!("Running the {key}");
        let result = request(input).await;
        drop(guard);
        self.0.notifier.close_editor();

        match result {
            Ok(value) => {
                #[cfg(feature = "tracing")]
                info!("The {key} succeeded");
                self.0.cache.invalidate();
                self.0.notifier.success(success_message);
                Ok(value)
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                warn!("The {key} failed: {err}");
                self.0.notifier.error(err.message());
                Err(err.into())
            }
        }
    }

    fn begin(&self, key: MutationKey) -> Result<InProgress<'_>, MutationError> {
        let mut state = self.0.state.lock();
        if !state.running.insert(key.clone()) {
            #[cfg(feature = "tracing")]
            debug!("Refusing {key}: already in progress");
            return Err(MutationError::InProgress(key));
        }
        Ok(InProgress {
            mutations: self,
            key,
            busy: false,
        })
    }
}

/// Nothing to check for a delete.
impl Validate for () {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

/// Reservation of one [`MutationKey`]; releases it and the indicator when dropped.
struct InProgress<'a> {
    mutations: &'a Mutations,
    key: MutationKey,
    busy: bool,
}

impl InProgress<'_> {
    fn start(&mut self) {
        let first = {
            let mut state = self.mutations.0.state.lock();
            state.busy += 1;
            state.busy == 1
        };
        self.busy = true;
        if first {
            self.mutations.0.notifier.progress(true);
        }
    }
}

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        let last = {
            let mut state = self.mutations.0.state.lock();
            state.running.remove(&self.key);
            if self.busy {
                state.busy -= 1;
                state.busy == 0
            } else {
                false
            }
        };
        if last {
            self.mutations.0.notifier.progress(false);
        }
    }
}
