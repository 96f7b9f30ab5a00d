//! What the note list looks like at a given moment.
//!
//! [`PageView`] is derived from a [`QueryState`] and the [`Paginator`] every
//! time it is asked for; it never holds state of its own.

use crate::{api::Note, cache::QueryState, pagination::Paginator};
use std::fmt;

pub const LOADING_MESSAGE: &str = "Loading notes...";
pub const EMPTY_MESSAGE: &str = "No notes available";

/// The main state of the list area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListStatus {
    /// Nothing to show yet; the first fetch is running.
    Loading,
    /// Nothing to show and the fetch failed.
    Failed(String),
    /// The page was fetched and holds no notes.
    Empty,
    /// Notes are available.
    Ready,
}

/// A renderable snapshot of the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub page: u32,
    pub total_pages: u32,
    pub notes: Vec<Note>,
    pub status: ListStatus,
    /// Error of the last fetch, also set while stale notes are still shown.
    pub error: Option<String>,
    pub is_fetching: bool,
    /// The notes belong to the previously displayed page.
    pub is_placeholder: bool,
    pub can_previous: bool,
    pub can_next: bool,
    /// A mutation is waiting on the service.
    pub is_mutating: bool,
}

impl PageView {
    /// Derives the view of `query` on top of the paginator's page range.
    pub fn new(query: &QueryState, paginator: &Paginator, is_mutating: bool) -> Self {
        let error = query.error.as_ref().map(|err| err.message());
        let notes = query
            .data
            .as_ref()
            .map(|data| data.notes.clone())
            .unwrap_or_default();
        let status = match (&query.data, &error) {
            (Some(_), _) if notes.is_empty() => ListStatus::Empty,
            (Some(_), _) => ListStatus::Ready,
            (None, Some(message)) if !query.is_fetching => ListStatus::Failed(message.clone()),
            (None, _) => ListStatus::Loading,
        };

        Self {
            page: paginator.page().get(),
            total_pages: paginator.total_pages(),
            notes,
            status,
            error,
            is_fetching: query.is_fetching,
            is_placeholder: query.is_placeholder,
            can_previous: paginator.has_previous() && !query.is_fetching,
            can_next: paginator.has_next() && !query.is_fetching,
            is_mutating,
        }
    }
}

impl fmt::Display for PageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            ListStatus::Loading => writeln!(f, "{LOADING_MESSAGE}")?,
            ListStatus::Failed(message) => writeln!(f, "Error: {message}")?,
            ListStatus::Empty => writeln!(f, "{EMPTY_MESSAGE}")?,
            ListStatus::Ready => {
                if let Some(message) = &self.error {
                    writeln!(f, "Error: {message}")?;
                }
                for note in &self.notes {
                    let marker = if note.is_published { "*" } else { " " };
                    writeln!(f, "[{marker}] {}: {}", note.title, note.content)?;
                }
            }
        }

        let previous = if self.can_previous { "< Prev" } else { "  Prev" };
        let next = if self.can_next { "Next >" } else { "Next  " };
        write!(
            f,
            "{previous} | Page {} of {} | {next}",
            self.page, self.total_pages
        )
    }
}
