//! Query cache for pages of the note list.
//!
//! [`PageCache`] owns one [`CacheEntry`] per [`PageKey`] and is the only place
//! where fetch results are written. Everything else reads it through
//! [`PageCache::snapshot`] or goes through its mutation entry points
//! ([`fetch_page`](PageCache::fetch_page), [`invalidate`](PageCache::invalidate),
//! [`clear`](PageCache::clear)).
//!
//! Fetches run on spawned tasks, so a caller that stops waiting (for example
//! because the user navigated away) does not cancel the request: its result
//! still lands in the cache. At most one fetch per page is in flight; callers
//! asking for a page that is already being fetched wait for that fetch.

use crate::{
    api::{Note, NotesResponse},
    notify::Notifier,
    pagination::{total_pages, PageKey},
    transport::{NoteTransport, TransportError},
};
use parking_lot::Mutex;
use std::{collections::HashMap, fmt, sync::Arc, time::Duration};
use tokio::{sync::watch, time::Instant};
#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

/// How long a fetched page is served without revalidation.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5);

/// One page of notes as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    /// The page these notes belong to.
    pub page: PageKey,
    /// Notes of the page, in server order.
    pub notes: Vec<Note>,
    /// Number of notes across all pages.
    pub total_count: u64,
}

impl PageResult {
    /// Checks a list response against the page it was requested for.
    ///
    /// A page holding more notes than `page_size`, or notes on a page beyond the
    /// reported total, means the client and the service disagree on the page
    /// size; such responses are rejected instead of being cached.
    pub fn from_response(
        page: PageKey,
        page_size: u32,
        response: NotesResponse,
    ) -> Result<Self, TransportError> {
        if response.notes.len() > page_size as usize {
            return Err(TransportError::Unknown(format!(
                "Server returned {} notes for a page of {page_size}",
                response.notes.len()
            )));
        }
        if !response.notes.is_empty() && total_pages(response.count, page_size) < page.get() {
            return Err(TransportError::Unknown(format!(
                "Server returned notes for page {page} but reported only {} notes",
                response.count
            )));
        }
        Ok(Self {
            page,
            notes: response.notes,
            total_count: response.count,
        })
    }
}

type FetchOutcome = Result<PageResult, TransportError>;

struct InFlight {
    seq: u64,
    /// Invalidation epoch the request went out under; `None` until it is sent.
    sent_epoch: Option<u64>,
    /// Set when the page was invalidated while the request was on the wire.
    refetch: bool,
    outcome: watch::Sender<Option<FetchOutcome>>,
}

/// The cache's record for one page.
#[derive(Default)]
struct CacheEntry {
    data: Option<PageResult>,
    error: Option<TransportError>,
    stale: bool,
    updated_at: Option<Instant>,
    in_flight: Option<InFlight>,
}

impl CacheEntry {
    fn is_expired(&self, stale_time: Duration) -> bool {
        self.updated_at
            .map_or(true, |updated_at| updated_at.elapsed() >= stale_time)
    }
}

/// Everything a view may know about one page, read in a single step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    /// The page that was asked for.
    pub page: PageKey,
    /// Last successful result, or the previous page's result when `is_placeholder` is set.
    pub data: Option<PageResult>,
    /// Error of the last fetch, if it failed.
    pub error: Option<TransportError>,
    pub is_fetching: bool,
    pub is_stale: bool,
    /// `data` belongs to another page and must not be used to count pages.
    pub is_placeholder: bool,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<PageKey, CacheEntry>,
    active: Option<PageKey>,
    epoch: u64,
    next_seq: u64,
}

impl CacheState {
    /// Registers a fetch for `page` unless one is already in flight.
    ///
    /// Returns a receiver for the fetch's outcome and, when a new fetch was
    /// registered, the sequence number the caller has to start it with.
    fn begin_fetch(&mut self, page: PageKey) -> (watch::Receiver<Option<FetchOutcome>>, Option<u64>) {
        let entry = self.entries.entry(page).or_default();
        if let Some(in_flight) = &entry.in_flight {
            return (in_flight.outcome.subscribe(), None);
        }

        self.next_seq += 1;
        let (outcome, receiver) = watch::channel(None);
        entry.in_flight = Some(InFlight {
            seq: self.next_seq,
            sent_epoch: None,
            refetch: false,
            outcome,
        });
        (receiver, Some(self.next_seq))
    }
}

struct CacheInner {
    transport: Arc<dyn NoteTransport>,
    notifier: Notifier,
    page_size: u32,
    stale_time: Duration,
    state: Mutex<CacheState>,
}

/// Cache of note-list pages kept in sync with the service.
#[derive(Clone)]
pub struct PageCache(Arc<CacheInner>);

impl fmt::Debug for PageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageCache")
            .field("page_size", &self.0.page_size)
            .field("stale_time", &self.0.stale_time)
            .field("pages", &self.pages())
            .finish()
    }
}

impl PageCache {
    /// Creates an empty cache fetching pages of `page_size` notes through `transport`.
    pub fn new(
        transport: Arc<dyn NoteTransport>,
        notifier: Notifier,
        page_size: u32,
        stale_time: Duration,
    ) -> Self {
        Self(Arc::new(CacheInner {
            transport,
            notifier,
            page_size: page_size.max(1),
            stale_time,
            state: Mutex::new(CacheState::default()),
        }))
    }

    pub fn page_size(&self) -> u32 {
        self.0.page_size
    }

    /// Returns the notes of `page`.
    ///
    /// A fresh cached result is returned right away; if it is older than the
    /// stale time a revalidation is started in the background. Otherwise the
    /// call waits for a fetch, joining the one already in flight if there is one.
    /// A failed fetch keeps the previous result in the cache.
    pub async fn fetch_page(&self, page: PageKey) -> Result<PageResult, TransportError> {
        let (mut outcome, start) = {
            let mut state = self.0.state.lock();
            let entry = state.entries.entry(page).or_default();
            if !entry.stale {
                if let Some(data) = entry.data.clone() {
                    if entry.in_flight.is_none() && entry.is_expired(self.0.stale_time) {
                        if let (_, Some(seq)) = state.begin_fetch(page) {
                            #[cfg(feature = "tracing")]
                            debug!("Revalidating page {page} in the background");
                            self.spawn_fetch(page, seq);
                        }
                    }
                    return Ok(data);
                }
            }
            state.begin_fetch(page)
        };

        if let Some(seq) = start {
            self.spawn_fetch(page, seq);
        }
        wait(&mut outcome).await
    }

    /// Waits for the fetch of `page` in flight, if any, and returns the page's state.
    pub async fn settled(&self, page: PageKey) -> QueryState {
        let outcome = {
            let state = self.0.state.lock();
            state
                .entries
                .get(&page)
                .and_then(|entry| entry.in_flight.as_ref())
                .map(|in_flight| in_flight.outcome.subscribe())
        };
        if let Some(mut outcome) = outcome {
            let _ = wait(&mut outcome).await;
        }
        self.snapshot(page)
    }

    /// Marks every cached page stale.
    ///
    /// The active page is refetched right away; other pages are refetched the
    /// next time they are asked for. Invalidating again before a refetch has
    /// been sent does not add another request. A page whose fetch is already on
    /// the wire gets exactly one follow-up fetch, and its waiters receive the
    /// follow-up's outcome.
    pub fn invalidate(&self) {
        let mut guard = self.0.state.lock();
        let state = &mut *guard;
        state.epoch += 1;
        for entry in state.entries.values_mut() {
            entry.stale = true;
            if let Some(in_flight) = entry.in_flight.as_mut().filter(|f| f.sent_epoch.is_some()) {
                in_flight.refetch = true;
            }
        }
        #[cfg(feature = "tracing")]
        info!("Invalidated {} cached pages", state.entries.len());

        let Some(active) = state.active else {
            return;
        };
        let needs_fetch = state
            .entries
            .get(&active)
            .is_some_and(|entry| entry.in_flight.is_none());
        if needs_fetch {
            if let (_, Some(seq)) = state.begin_fetch(active) {
                drop(guard);
                self.spawn_fetch(active, seq);
            }
        }
    }

    /// Marks `page` as the one currently rendered.
    pub fn set_active(&self, page: PageKey) {
        self.0.state.lock().active = Some(page);
    }

    pub fn active(&self) -> Option<PageKey> {
        self.0.state.lock().active
    }

    pub fn is_fetching(&self, page: PageKey) -> bool {
        self.0
            .state
            .lock()
            .entries
            .get(&page)
            .is_some_and(|entry| entry.in_flight.is_some())
    }

    /// Reads the state of `page`.
    pub fn snapshot(&self, page: PageKey) -> QueryState {
        let state = self.0.state.lock();
        match state.entries.get(&page) {
            Some(entry) => QueryState {
                page,
                data: entry.data.clone(),
                error: entry.error.clone(),
                is_fetching: entry.in_flight.is_some(),
                is_stale: entry.stale,
                is_placeholder: false,
            },
            None => QueryState {
                page,
                ..Default::default()
            },
        }
    }

    /// Reads the state of `page`, borrowing the result of `previous` while the
    /// first fetch of `page` is in flight.
    pub fn snapshot_with_placeholder(&self, page: PageKey, previous: Option<PageKey>) -> QueryState {
        let mut snapshot = self.snapshot(page);
        if snapshot.data.is_some() || !snapshot.is_fetching {
            return snapshot;
        }
        let Some(previous) = previous.filter(|previous| *previous != page) else {
            return snapshot;
        };
        let placeholder = self
            .0
            .state
            .lock()
            .entries
            .get(&previous)
            .and_then(|entry| entry.data.clone());
        if placeholder.is_some() {
            snapshot.data = placeholder;
            snapshot.is_placeholder = true;
        }
        snapshot
    }

    /// Returns the cached pages in ascending order.
    pub fn pages(&self) -> Vec<PageKey> {
        let mut pages: Vec<PageKey> = self.0.state.lock().entries.keys().copied().collect();
        pages.sort();
        pages
    }

    /// Drops every entry. Results of fetches still in flight are discarded.
    pub fn clear(&self) {
        let entries = std::mem::take(&mut self.0.state.lock().entries);
        for in_flight in entries.into_values().filter_map(|entry| entry.in_flight) {
            in_flight
                .outcome
                .send_replace(Some(Err(TransportError::Unknown("Cache cleared".to_string()))));
        }
    }

    fn spawn_fetch(&self, page: PageKey, seq: u64) {
        let cache = self.clone();
        tokio::spawn(async move {
            cache.run_fetch(page, seq).await;
        });
    }

    async fn run_fetch(&self, page: PageKey, mut seq: u64) {
        loop {
            let request = {
                let mut guard = self.0.state.lock();
                let state = &mut *guard;
                let Some(in_flight) = state
                    .entries
                    .get_mut(&page)
                    .and_then(|entry| entry.in_flight.as_mut())
                    .filter(|in_flight| in_flight.seq == seq)
                else {
                    return;
                };
                in_flight.sent_epoch = Some(state.epoch);
                self.0.transport.list_notes(page.get(), self.0.page_size)
            };

            #[cfg(feature = "tracing")]
            debug!("Fetching page {page}");
            let outcome = match request.await {
                Ok(response) => PageResult::from_response(page, self.0.page_size, response),
                Err(err) => Err(err),
            };

            match self.complete(page, seq, outcome) {
                Some(next) => seq = next,
                None => return,
            }
        }
    }

    /// Applies the outcome of fetch `seq` to `page`.
    ///
    /// Returns the sequence number of a follow-up fetch when the page was
    /// invalidated while this one was on the wire.
    fn complete(&self, page: PageKey, seq: u64, outcome: FetchOutcome) -> Option<u64> {
        let mut failure = None;
        let follow_up = {
            let mut guard = self.0.state.lock();
            let state = &mut *guard;
            let Some(entry) = state.entries.get_mut(&page) else {
                #[cfg(feature = "tracing")]
                debug!("Discarding result for evicted page {page}");
                return None;
            };
            let Some(in_flight) = entry.in_flight.as_mut().filter(|in_flight| in_flight.seq == seq) else {
                #[cfg(feature = "tracing")]
                debug!("Discarding outdated result for page {page}");
                return None;
            };

            let sent_epoch = in_flight.sent_epoch.unwrap_or(state.epoch);
            match &outcome {
                Ok(result) => {
                    entry.data = Some(result.clone());
                    entry.error = None;
                    entry.stale = sent_epoch < state.epoch;
                    entry.updated_at = Some(Instant::now());
                }
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    warn!("Fetching page {page} failed: {err}");
                    entry.error = Some(err.clone());
                    failure = Some(err.message());
                }
            }

            match entry.in_flight.take() {
                Some(mut in_flight) if in_flight.refetch => {
                    state.next_seq += 1;
                    in_flight.seq = state.next_seq;
                    in_flight.sent_epoch = None;
                    in_flight.refetch = false;
                    entry.in_flight = Some(in_flight);
                    Some(state.next_seq)
                }
                Some(in_flight) => {
                    in_flight.outcome.send_replace(Some(outcome));
                    None
                }
                None => None,
            }
        };

        if let Some(message) = failure {
            self.0.notifier.error(message);
        }
        follow_up
    }
}

async fn wait(outcome: &mut watch::Receiver<Option<FetchOutcome>>) -> FetchOutcome {
    let result = match outcome.wait_for(Option::is_some).await {
        Ok(value) => value.clone(),
        Err(_) => None,
    };
    result.unwrap_or_else(|| Err(TransportError::Unknown("Fetch ended without a result".to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        notify::recorder::Recorder,
        transport::memory::{MemoryTransport, Operation},
    };

    fn cache(transport: &MemoryTransport, recorder: &Recorder) -> PageCache {
        PageCache::new(
            Arc::new(transport.clone()),
            recorder.notifier(),
            10,
            DEFAULT_STALE_TIME,
        )
    }

    async fn pump() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_fetch_stores_result() {
        let transport = MemoryTransport::with_notes(25);
        let cache = cache(&transport, &Recorder::default());

        let page = cache.fetch_page(PageKey::FIRST).await.unwrap();
        assert_eq!(page.notes.len(), 10);
        assert_eq!(page.total_count, 25);

        let snapshot = cache.snapshot(PageKey::FIRST);
        assert_eq!(snapshot.data, Some(page));
        assert!(!snapshot.is_fetching);
        assert!(!snapshot.is_stale);
        assert_eq!(transport.calls(Operation::List), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_page_is_served_from_cache() {
        let transport = MemoryTransport::with_notes(5);
        let cache = cache(&transport, &Recorder::default());

        cache.fetch_page(PageKey::FIRST).await.unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.fetch_page(PageKey::FIRST).await.unwrap();
        pump().await;

        assert_eq!(transport.calls(Operation::List), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_page_is_served_then_revalidated() {
        let transport = MemoryTransport::with_notes(5);
        let cache = cache(&transport, &Recorder::default());

        cache.fetch_page(PageKey::FIRST).await.unwrap();
        transport.seed("Extra", "Added on the server");
        tokio::time::advance(DEFAULT_STALE_TIME).await;

        let served = cache.fetch_page(PageKey::FIRST).await.unwrap();
        assert_eq!(served.total_count, 5);
        assert!(cache.is_fetching(PageKey::FIRST));

        let settled = cache.settled(PageKey::FIRST).await;
        assert_eq!(settled.data.unwrap().total_count, 6);
        assert_eq!(transport.calls(Operation::List), 2);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_share_one_request() {
        let transport = MemoryTransport::with_notes(40);
        let cache = cache(&transport, &Recorder::default());

        let (a, b) = tokio::join!(
            cache.fetch_page(PageKey::new(3)),
            cache.fetch_page(PageKey::new(3))
        );
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(transport.calls(Operation::List), 1);
    }

    #[tokio::test]
    async fn test_pages_are_isolated() {
        let transport = MemoryTransport::with_notes(25);
        let recorder = Recorder::default();
        let cache = cache(&transport, &recorder);

        cache.fetch_page(PageKey::FIRST).await.unwrap();
        transport.hold(Operation::List);
        transport.fail_next(Operation::List, TransportError::Network("offline".into()));

        let second = tokio::spawn({
            let cache = cache.clone();
            async move { cache.fetch_page(PageKey::new(2)).await }
        });
        pump().await;
        assert!(cache.is_fetching(PageKey::new(2)));
        assert!(!cache.is_fetching(PageKey::FIRST));

        transport.release(Operation::List);
        assert!(second.await.unwrap().is_err());

        let first = cache.snapshot(PageKey::FIRST);
        assert!(first.error.is_none());
        assert!(!first.is_fetching);
        assert!(first.data.is_some());
        assert!(cache.snapshot(PageKey::new(2)).error.is_some());
        assert_eq!(recorder.errors(), vec!["Network Error".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_refetch_keeps_previous_result() {
        let transport = MemoryTransport::with_notes(3);
        let recorder = Recorder::default();
        let cache = cache(&transport, &recorder);

        let original = cache.fetch_page(PageKey::FIRST).await.unwrap();
        cache.invalidate();
        transport.fail_next(
            Operation::List,
            TransportError::from_status(500, r#"{"status":"error","message":"Database error"}"#),
        );

        let err = cache.fetch_page(PageKey::FIRST).await.unwrap_err();
        assert_eq!(err.message(), "Database error");

        let snapshot = cache.snapshot(PageKey::FIRST);
        assert_eq!(snapshot.data, Some(original));
        assert_eq!(snapshot.error, Some(err));
        assert!(!snapshot.is_fetching);
        assert_eq!(recorder.errors(), vec!["Database error".to_string()]);
    }

    #[tokio::test]
    async fn test_invalidate_twice_fetches_once() {
        let transport = MemoryTransport::with_notes(3);
        let cache = cache(&transport, &Recorder::default());

        cache.set_active(PageKey::FIRST);
        cache.fetch_page(PageKey::FIRST).await.unwrap();

        cache.invalidate();
        cache.invalidate();
        let settled = cache.settled(PageKey::FIRST).await;
        pump().await;

        assert_eq!(transport.calls(Operation::List), 2);
        assert!(!settled.is_stale);
        assert!(!settled.is_fetching);
        assert_eq!(settled, cache.snapshot(PageKey::FIRST));
    }

    #[tokio::test]
    async fn test_invalidate_refetches_inactive_pages_lazily() {
        let transport = MemoryTransport::with_notes(25);
        let cache = cache(&transport, &Recorder::default());

        cache.fetch_page(PageKey::new(2)).await.unwrap();
        cache.set_active(PageKey::FIRST);
        cache.fetch_page(PageKey::FIRST).await.unwrap();

        cache.invalidate();
        cache.settled(PageKey::FIRST).await;
        assert_eq!(transport.calls(Operation::List), 3);
        assert!(cache.snapshot(PageKey::new(2)).is_stale);
        assert!(!cache.is_fetching(PageKey::new(2)));

        cache.fetch_page(PageKey::new(2)).await.unwrap();
        assert_eq!(transport.calls(Operation::List), 4);
        assert!(!cache.snapshot(PageKey::new(2)).is_stale);
    }

    #[tokio::test]
    async fn test_invalidate_during_fetch_queues_follow_up() {
        let transport = MemoryTransport::with_notes(3);
        let cache = cache(&transport, &Recorder::default());
        cache.set_active(PageKey::FIRST);

        transport.hold(Operation::List);
        let waiter = tokio::spawn({
            let cache = cache.clone();
            async move { cache.fetch_page(PageKey::FIRST).await }
        });
        pump().await;
        assert_eq!(transport.calls(Operation::List), 1);

        transport.seed("New", "Created while the page was loading");
        cache.invalidate();
        cache.invalidate();
        transport.release(Operation::List);

        let page = waiter.await.unwrap().unwrap();
        assert_eq!(page.total_count, 4);
        assert_eq!(transport.calls(Operation::List), 2);
        assert!(!cache.snapshot(PageKey::FIRST).is_stale);
    }

    #[tokio::test]
    async fn test_cleared_cache_discards_outdated_result() {
        let transport = MemoryTransport::with_notes(3);
        let cache = cache(&transport, &Recorder::default());

        transport.hold(Operation::List);
        let outdated = tokio::spawn({
            let cache = cache.clone();
            async move { cache.fetch_page(PageKey::FIRST).await }
        });
        pump().await;

        cache.clear();
        assert!(outdated.await.unwrap().is_err());

        transport.seed("New", "Body");
        let current = tokio::spawn({
            let cache = cache.clone();
            async move { cache.fetch_page(PageKey::FIRST).await }
        });
        pump().await;
        transport.release(Operation::List);

        let page = current.await.unwrap().unwrap();
        pump().await;
        assert_eq!(page.total_count, 4);
        assert_eq!(
            cache.snapshot(PageKey::FIRST).data.unwrap().total_count,
            4
        );
    }

    #[tokio::test]
    async fn test_page_size_mismatch_is_rejected() {
        let transport = MemoryTransport::with_notes(25).with_server_page_size(20);
        let recorder = Recorder::default();
        let cache = cache(&transport, &recorder);

        let err = cache.fetch_page(PageKey::FIRST).await.unwrap_err();
        assert!(matches!(err, TransportError::Unknown(_)));
        assert!(cache.snapshot(PageKey::FIRST).data.is_none());
        assert_eq!(recorder.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_placeholder_borrows_previous_page() {
        let transport = MemoryTransport::with_notes(25);
        let cache = cache(&transport, &Recorder::default());
        let first = cache.fetch_page(PageKey::FIRST).await.unwrap();

        let snapshot = cache.snapshot_with_placeholder(PageKey::new(2), Some(PageKey::FIRST));
        assert!(!snapshot.is_placeholder);
        assert!(snapshot.data.is_none());

        transport.hold(Operation::List);
        let second = tokio::spawn({
            let cache = cache.clone();
            async move { cache.fetch_page(PageKey::new(2)).await }
        });
        pump().await;
        let snapshot = cache.snapshot_with_placeholder(PageKey::new(2), Some(PageKey::FIRST));
        assert!(snapshot.is_placeholder);
        assert!(snapshot.is_fetching);
        assert_eq!(snapshot.data, Some(first));

        transport.release(Operation::List);
        second.await.unwrap().unwrap();
        let snapshot = cache.snapshot_with_placeholder(PageKey::new(2), Some(PageKey::FIRST));
        assert!(!snapshot.is_placeholder);
        assert_eq!(snapshot.data.unwrap().page, PageKey::new(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_revalidation_keeps_served_result() {
        let transport = MemoryTransport::with_notes(5);
        let recorder = Recorder::default();
        let cache = cache(&transport, &recorder);

        let original = cache.fetch_page(PageKey::FIRST).await.unwrap();
        tokio::time::advance(DEFAULT_STALE_TIME).await;
        transport.fail_next(Operation::List, TransportError::Network("offline".into()));

        let served = cache.fetch_page(PageKey::FIRST).await.unwrap();
        assert_eq!(served, original);

        let settled = cache.settled(PageKey::FIRST).await;
        assert_eq!(settled.data, Some(original));
        assert_eq!(settled.error, Some(TransportError::Network("offline".into())));
        assert!(!settled.is_fetching);
        assert!(!settled.is_stale);
        assert_eq!(recorder.errors(), vec!["Network Error".to_string()]);
        assert_eq!(transport.calls(Operation::List), 2);
    }

    #[tokio::test]
    async fn test_invalidate_refetches_inactive_page_on_the_wire() {
        let transport = MemoryTransport::with_notes(25);
        let cache = cache(&transport, &Recorder::default());
        cache.set_active(PageKey::FIRST);
        cache.fetch_page(PageKey::FIRST).await.unwrap();

        transport.hold(Operation::List);
        let waiter = tokio::spawn({
            let cache = cache.clone();
            async move { cache.fetch_page(PageKey::new(2)).await }
        });
        pump().await;
        assert_eq!(transport.calls(Operation::List), 2);

        transport.seed("New", "Created while page 2 was loading");
        cache.invalidate();
        transport.release(Operation::List);

        let page = waiter.await.unwrap().unwrap();
        cache.settled(PageKey::FIRST).await;
        assert_eq!(page.total_count, 26);
        assert!(!cache.snapshot(PageKey::new(2)).is_stale);
        assert_eq!(transport.calls(Operation::List), 4);
    }

    #[test]
    fn test_result_rejects_notes_beyond_total() {
        let response = NotesResponse {
            status: "success".into(),
            count: 0,
            notes: MemoryTransport::with_notes(1).notes(),
        };
        assert!(PageResult::from_response(PageKey::new(2), 10, response.clone()).is_err());
        assert!(PageResult::from_response(PageKey::FIRST, 10, response).is_ok());

        let empty = NotesResponse {
            status: "success".into(),
            count: 0,
            notes: Vec::new(),
        };
        assert!(PageResult::from_response(PageKey::new(4), 10, empty).is_ok());
    }
}
