//! Client options and configuration types.

use crate::{
    callback::{OnCloseEditor, OnNotify, OnProgress},
    pagination::DEFAULT_PAGE_SIZE,
    transport::NoteTransport,
};
use std::{fmt, sync::Arc, time::Duration};
#[cfg(feature = "tracing")]
use tracing::warn;

/// Where the notes service lives unless configured otherwise.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1/";
/// How long an HTTP request may take before it fails as a network error.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_BASE_URL: &str = "NOTES_API_URL";
pub const ENV_PAGE_SIZE: &str = "NOTES_PAGE_SIZE";

/// Options for [`NotesClient::new_with_options`](crate::NotesClient::new_with_options).
///
/// Every field is optional; unset fields fall back to the defaults of this module.
///
/// # Usage
/// ```
/// use notes_sync_client::{notify::Notification, option::NotesClientOptions};
///
/// let options = NotesClientOptions::builder()
///     .base_url("http://localhost:8000/api/")
///     .page_size(20)
///     .on_notify(|notification: Notification| println!("{}", notification.message))
///     .build();
/// assert_eq!(options.page_size(), 20);
/// ```
#[derive(Clone, Default, bon::Builder)]
pub struct NotesClientOptions {
    /// Base URL of the service; the `notes` resource is resolved against it.
    #[builder(into)]
    pub base_url: Option<String>,

    /// Notes per page. Must match the page size the service uses.
    pub page_size: Option<u32>,

    /// How long a fetched page is served before it is revalidated. If not provided, 5 seconds will be used.
    pub stale_time: Option<Duration>,

    /// Timeout of each HTTP request. If not provided, 30 seconds will be used.
    pub request_timeout: Option<Duration>,

    /// Transport to use instead of the HTTP one. `base_url` and `request_timeout` are ignored when set.
    pub transport: Option<Arc<dyn NoteTransport>>,

    /// Callback for success and error notifications.
    #[builder(into)]
    pub on_notify: Option<OnNotify>,

    /// Callback for the global in-progress indicator.
    #[builder(into)]
    pub on_progress: Option<OnProgress>,

    /// Callback closing the create/edit surface after a submit.
    #[builder(into)]
    pub on_close_editor: Option<OnCloseEditor>,
}

impl fmt::Debug for NotesClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotesClientOptions")
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .field("stale_time", &self.stale_time)
            .field("request_timeout", &self.request_timeout)
            .field("transport", &self.transport.as_ref().map(|_| "custom"))
            .field("on_notify", &self.on_notify)
            .field("on_progress", &self.on_progress)
            .field("on_close_editor", &self.on_close_editor)
            .finish()
    }
}

impl NotesClientOptions {
    /// Default options overridden by `NOTES_API_URL` and `NOTES_PAGE_SIZE` when they are set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let page_size = lookup(ENV_PAGE_SIZE).and_then(|value| match value.trim().parse::<u32>() {
            Ok(size) if size > 0 => Some(size),
            _ => {
                #[cfg(feature = "tracing")]
                warn!("Ignoring invalid {ENV_PAGE_SIZE} value {value:?}");
                None
            }
        });
        Self {
            base_url: lookup(ENV_BASE_URL).filter(|url| !url.trim().is_empty()),
            page_size,
            ..Default::default()
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1)
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time.unwrap_or(crate::cache::DEFAULT_STALE_TIME)
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let options = NotesClientOptions::default();
        assert_eq!(options.base_url(), DEFAULT_BASE_URL);
        assert_eq!(options.page_size(), 10);
        assert_eq!(options.stale_time(), Duration::from_secs(5));
        assert_eq!(options.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_builder_sets_fields() {
        let options = NotesClientOptions::builder()
            .base_url("http://example.com/api/")
            .stale_time(Duration::ZERO)
            .on_progress(|_busy: bool| {})
            .build();
        assert_eq!(options.base_url(), "http://example.com/api/");
        assert_eq!(options.stale_time(), Duration::ZERO);
        assert!(options.on_progress.is_some());
        assert!(options.on_notify.is_none());
    }

    #[test]
    fn test_environment_overrides() {
        let env = HashMap::from([
            (ENV_BASE_URL, "http://notes.internal/api/v1/".to_string()),
            (ENV_PAGE_SIZE, "25".to_string()),
        ]);
        let options = NotesClientOptions::from_lookup(|key| env.get(key).cloned());
        assert_eq!(options.base_url(), "http://notes.internal/api/v1/");
        assert_eq!(options.page_size(), 25);
    }

    #[test]
    fn test_invalid_page_size_is_ignored() {
        let options = NotesClientOptions::from_lookup(|key| match key {
            ENV_PAGE_SIZE => Some("zero".to_string()),
            _ => None,
        });
        assert_eq!(options.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(options.base_url(), DEFAULT_BASE_URL);
    }
}
