//! Page bookkeeping for the note list.

use derive_more::Display;
#[cfg(feature = "tracing")]
use tracing::debug;

/// Number of notes per page. Must match the service's default `limit`.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Identifies one page of the note list. Always at least 1.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageKey(u32);

impl PageKey {
    pub const FIRST: PageKey = PageKey(1);

    /// Creates a page key, treating 0 as the first page.
    pub fn new(page: u32) -> Self {
        Self(page.max(1))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for PageKey {
    fn default() -> Self {
        Self::FIRST
    }
}

impl From<u32> for PageKey {
    fn from(page: u32) -> Self {
        Self::new(page)
    }
}

/// Number of pages needed for `count` notes; an empty list still has one page.
pub fn total_pages(count: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    let pages = count.div_ceil(page_size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Tracks the current page and clamps navigation to the known page range.
///
/// The total is only ever fed from authoritative fetch results, never from
/// placeholder data, so the range can lag behind the server but never invents
/// pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    page: PageKey,
    page_size: u32,
    total_count: Option<u64>,
}

impl Paginator {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: PageKey::FIRST,
            page_size: page_size.max(1),
            total_count: None,
        }
    }

    pub fn page(&self) -> PageKey {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// The last known total number of notes, if a page has been loaded.
    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    pub fn total_pages(&self) -> u32 {
        total_pages(self.total_count.unwrap_or(0), self.page_size)
    }

    pub fn has_previous(&self) -> bool {
        self.page.get() > 1
    }

    pub fn has_next(&self) -> bool {
        self.page.get() < self.total_pages()
    }

    /// Moves to `page`, clamped to `[1, total_pages]`. Returns the resulting page.
    pub fn go_to(&mut self, page: u32) -> PageKey {
        self.page = PageKey::new(page.min(self.total_pages()));
        self.page
    }

    /// Moves one page forward. Does nothing on the last page.
    pub fn next(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.page = PageKey::new(self.page.get() + 1);
        true
    }

    /// Moves one page back. Does nothing on the first page.
    pub fn previous(&mut self) -> bool {
        if !self.has_previous() {
            return false;
        }
        self.page = PageKey::new(self.page.get() - 1);
        true
    }

    /// Records the server-reported total.
    ///
    /// When the list shrank below the current page, the current page is clamped
    /// to the new last page and returned so the caller can fetch it.
    pub fn sync_total(&mut self, total_count: u64) -> Option<PageKey> {
        self.total_count = Some(total_count);
        let last = self.total_pages();
        if self.page.get() > last {
            #[cfg(feature = "tracing")]
            debug!("Page {} no longer exists, clamping to {last}", self.page);
            self.page = PageKey::new(last);
            return Some(self.page);
        }
        None
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}
