//! The client facade tying the transport, the page cache, mutations and
//! pagination together.

use crate::{
    api::{CreateNoteInput, Note, NoteId, UpdateNoteInput},
    cache::PageCache,
    mutation::{MutationError, Mutations},
    notify::Notifier,
    option::NotesClientOptions,
    pagination::{PageKey, Paginator},
    transport::{HttpTransport, NoteTransport, TransportError},
    view::PageView,
};
use parking_lot::Mutex;
use std::{fmt, sync::Arc};
use thiserror::Error;
#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// The error type for the notes client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The base URL could not be parsed.
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    /// The base URL cannot have paths resolved against it.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    /// A service call failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A create, update or delete was refused or failed.
    #[error(transparent)]
    Mutation(#[from] MutationError),
    /// Navigation was refused.
    #[error(transparent)]
    Navigation(#[from] NavigationError),
}

/// Why the current page cannot be changed right now.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationError {
    /// The current page is still being fetched.
    #[error("Page {0} is still loading")]
    Busy(PageKey),
}

#[derive(Debug)]
struct Navigation {
    paginator: Paginator,
    /// The page displayed before the current one, used as placeholder.
    previous: Option<PageKey>,
}

struct NotesClientInner {
    transport: Arc<dyn NoteTransport>,
    cache: PageCache,
    mutations: Mutations,
    notifier: Notifier,
    navigation: Mutex<Navigation>,
}

impl fmt::Debug for NotesClientInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotesClientInner")
            .field("cache", &self.cache)
            .field("mutations", &self.mutations)
            .field("navigation", &*self.navigation.lock())
            .finish()
    }
}

/// A paginated, cached view of the notes service.
///
/// Cloning is cheap; clones share the cache and the current page.
///
/// # Usage
/// ```no_run
/// use notes_sync_client::NotesClient;
///
/// # async fn run() -> Result<(), notes_sync_client::ClientError> {
/// let client = NotesClient::new("http://localhost:8080/api/v1/")?;
/// let view = client.load().await?;
/// println!("{view}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct NotesClient(Arc<NotesClientInner>);

impl NotesClient {
    /// Creates a client for the service at `base_url` with default options.
    pub fn new<T: AsRef<str>>(base_url: T) -> Result<Self, ClientError> {
        let options = NotesClientOptions::builder()
            .base_url(base_url.as_ref())
            .build();
        Self::new_with_options(options)
    }

    /// Creates a client from the given options.
    pub fn new_with_options(options: NotesClientOptions) -> Result<Self, ClientError> {
        let transport: Arc<dyn NoteTransport> = match options.transport.clone() {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(
                options.base_url(),
                options.request_timeout(),
            )?),
        };
        Ok(Self::from_parts(transport, &options))
    }

    /// Creates a client on top of `transport` with otherwise default options.
    pub fn with_transport<T: NoteTransport + 'static>(transport: T) -> Self {
        Self::from_parts(Arc::new(transport), &NotesClientOptions::default())
    }

    fn from_parts(transport: Arc<dyn NoteTransport>, options: &NotesClientOptions) -> Self {
        let notifier = Notifier::new(
            options.on_notify.clone(),
            options.on_progress.clone(),
            options.on_close_editor.clone(),
        );
        let cache = PageCache::new(
            transport.clone(),
            notifier.clone(),
            options.page_size(),
            options.stale_time(),
        );
        cache.set_active(PageKey::FIRST);
        let mutations = Mutations::new(transport.clone(), cache.clone(), notifier.clone());

        Self(Arc::new(NotesClientInner {
            transport,
            cache,
            mutations,
            notifier,
            navigation: Mutex::new(Navigation {
                paginator: Paginator::new(options.page_size()),
                previous: None,
            }),
        }))
    }

    pub fn cache(&self) -> &PageCache {
        &self.0.cache
    }

    pub fn mutations(&self) -> &Mutations {
        &self.0.mutations
    }

    /// The page currently displayed.
    pub fn page(&self) -> PageKey {
        self.0.navigation.lock().paginator.page()
    }

    pub fn total_pages(&self) -> u32 {
        self.0.navigation.lock().paginator.total_pages()
    }

    /// Derives the view of the current page from the cache.
    pub fn view(&self) -> PageView {
        let (paginator, previous) = {
            let navigation = self.0.navigation.lock();
            (navigation.paginator.clone(), navigation.previous)
        };
        let query = self
            .0
            .cache
            .snapshot_with_placeholder(paginator.page(), previous);
        PageView::new(&query, &paginator, self.0.mutations.is_busy())
    }

    /// Fetches the current page and updates the page range from its total.
    ///
    /// When the list shrank below the current page, the new last page is
    /// loaded instead.
    pub async fn load(&self) -> Result<PageView, ClientError> {
        let mut page = self.page();
        loop {
            let result = self.0.cache.fetch_page(page).await?;
            let clamped = {
                let mut navigation = self.0.navigation.lock();
                if navigation.paginator.page() != page {
                    #[cfg(feature = "tracing")]
                    debug!("Page {page} loaded after navigating away");
                    None
                } else {
                    let clamped = navigation.paginator.sync_total(result.total_count);
                    if clamped.is_some() {
                        navigation.previous = Some(page);
                    }
                    clamped
                }
            };
            match clamped {
                Some(last) => {
                    self.0.cache.set_active(last);
                    page = last;
                }
                None => return Ok(self.view()),
            }
        }
    }

    /// Waits for the refetch of the current page that follows a mutation, then loads it.
    pub async fn refresh(&self) -> Result<PageView, ClientError> {
        let state = self.0.cache.settled(self.page()).await;
        if let Some(err) = state.error {
            return Err(err.into());
        }
        self.load().await
    }

    /// Moves to the next page and loads it. Does nothing on the last page.
    pub async fn next_page(&self) -> Result<PageView, ClientError> {
        self.navigate(Paginator::next).await
    }

    /// Moves to the previous page and loads it. Does nothing on the first page.
    pub async fn previous_page(&self) -> Result<PageView, ClientError> {
        self.navigate(Paginator::previous).await
    }

    /// Moves to `page`, clamped to the known page range, and loads it.
    pub async fn go_to_page(&self, page: u32) -> Result<PageView, ClientError> {
        self.navigate(|paginator| {
            let current = paginator.page();
            paginator.go_to(page) != current
        })
        .await
    }

    async fn navigate<F>(&self, step: F) -> Result<PageView, ClientError>
    where
        F: FnOnce(&mut Paginator) -> bool,
    {
        let moved = {
            let mut navigation = self.0.navigation.lock();
            let current = navigation.paginator.page();
            if self.0.cache.is_fetching(current) {
                #[cfg(feature = "tracing")]
                debug!("Refusing to navigate away from page {current} while it loads");
                return Err(NavigationError::Busy(current).into());
            }
            let moved = step(&mut navigation.paginator);
            if moved {
                navigation.previous = Some(current);
                self.0.cache.set_active(navigation.paginator.page());
            }
            moved
        };
        if !moved {
            return Ok(self.view());
        }
        self.load().await
    }

    /// Fetches a single note.
    pub async fn note(&self, id: &NoteId) -> Result<Note, ClientError> {
        match self.0.transport.get_note(id).await {
            Ok(note) => Ok(note),
            Err(err) => {
                self.0.notifier.error(err.message());
                Err(err.into())
            }
        }
    }

    /// Creates a note and reloads the current page.
    pub async fn create_note(&self, input: CreateNoteInput) -> Result<Note, ClientError> {
        let note = self.0.mutations.create(input).await?;
        self.reload_after_mutation().await;
        Ok(note)
    }

    /// Updates a note and reloads the current page.
    pub async fn update_note(&self, id: &NoteId, input: UpdateNoteInput) -> Result<Note, ClientError> {
        let note = self.0.mutations.update(id, input).await?;
        self.reload_after_mutation().await;
        Ok(note)
    }

    /// Deletes a note and reloads the current page, moving back if it no longer exists.
    pub async fn delete_note(&self, id: &NoteId) -> Result<String, ClientError> {
        let message = self.0.mutations.delete(id).await?;
        self.reload_after_mutation().await;
        Ok(message)
    }

    /// Failures here were already reported by the cache; the mutation itself succeeded.
    async fn reload_after_mutation(&self) {
        if let Err(_err) = self.refresh().await {
            #[cfg(feature = "tracing")]
            warn!("Reloading after a mutation failed: {_err}");
        }
    }
}
