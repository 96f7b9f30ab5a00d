//! Callbacks through which the client reaches the presentation layer.

use crate::notify::Notification;
use parking_lot::Mutex;
use std::{fmt, sync::Arc};

pub(crate) type OnNotifyInner = Box<dyn FnMut(Notification) + Send>;

/// The callback executed for every user-facing notification, e.g. to show a toast.
///
/// # Usage
/// ```
/// use notes_sync_client::{callback::OnNotify, notify::Notification};
///
/// let on_notify = OnNotify::from(|notification: Notification| {
///     println!("{}", notification.message);
/// });
/// ```
#[derive(Clone)]
pub struct OnNotify(pub(crate) Arc<Mutex<OnNotifyInner>>);

impl<F> From<F> for OnNotify
where
    F: FnMut(Notification) + Send + 'static,
{
    fn from(f: F) -> Self {
        OnNotify(Arc::new(Mutex::new(Box::new(f))))
    }
}

impl fmt::Debug for OnNotify {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OnNotify")
    }
}

pub(crate) type OnProgressInner = Box<dyn FnMut(bool) + Send>;

/// The callback executed when the global in-progress indicator starts (`true`) or stops (`false`).
///
/// # Usage
/// ```
/// use notes_sync_client::callback::OnProgress;
///
/// let on_progress = OnProgress::from(|busy: bool| {
///     // Start or finish the progress bar
/// });
/// ```
#[derive(Clone)]
pub struct OnProgress(pub(crate) Arc<Mutex<OnProgressInner>>);

impl<F> From<F> for OnProgress
where
    F: FnMut(bool) + Send + 'static,
{
    fn from(f: F) -> Self {
        OnProgress(Arc::new(Mutex::new(Box::new(f))))
    }
}

impl fmt::Debug for OnProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OnProgress")
    }
}

pub(crate) type OnCloseEditorInner = Box<dyn FnMut() + Send>;

/// The callback executed when a submitted form should be closed.
#[derive(Clone)]
pub struct OnCloseEditor(pub(crate) Arc<Mutex<OnCloseEditorInner>>);

impl<F> From<F> for OnCloseEditor
where
    F: FnMut() + Send + 'static,
{
    fn from(f: F) -> Self {
        OnCloseEditor(Arc::new(Mutex::new(Box::new(f))))
    }
}

impl fmt::Debug for OnCloseEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OnCloseEditor")
    }
}
