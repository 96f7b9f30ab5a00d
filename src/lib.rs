//! Client-side data synchronization for a notes service.
//!
//! The crate keeps a paginated note list in sync with a REST backend: pages are
//! cached per page number and revalidated in the background, mutations go
//! through a validated lifecycle that invalidates the list on success, and the
//! current page is clamped whenever the list shrinks.
//!
//! Rendering is left to the caller. Feedback reaches the presentation layer
//! through the callbacks in [`callback`], and [`view::PageView`] describes what
//! the list area should show.
//!
//! # Usage
//! ```
//! use notes_sync_client::{api::CreateNoteInput, transport::MemoryTransport, NotesClient};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), notes_sync_client::ClientError> {
//! let client = NotesClient::with_transport(MemoryTransport::with_notes(25));
//!
//! let view = client.load().await?;
//! assert_eq!(view.total_pages, 3);
//!
//! client.create_note(CreateNoteInput::new("Groceries", "Milk")).await?;
//! let view = client.go_to_page(3).await?;
//! assert_eq!(view.notes.len(), 6);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod client;
pub mod mutation;
pub mod notify;
pub mod option;
pub mod pagination;
pub mod transport;
pub mod validate;
pub mod view;
mod util;

pub use client::{ClientError, NavigationError, NotesClient};
pub use option::NotesClientOptions;
pub use util::callback;
