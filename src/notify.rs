//! User-facing feedback: toasts, the progress indicator and the editing surface.
//!
//! The client never renders anything itself. It reports through a [`Notifier`],
//! which forwards to whatever callbacks the presentation layer registered.

use crate::callback::{OnCloseEditor, OnNotify, OnProgress};
#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

/// Severity of a [`Notification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Error,
}

/// A single user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success<T: Into<String>>(message: T) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error<T: Into<String>>(message: T) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

/// Dispatches feedback to the registered callbacks. Missing callbacks are skipped.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    pub(crate) on_notify: Option<OnNotify>,
    pub(crate) on_progress: Option<OnProgress>,
    pub(crate) on_close_editor: Option<OnCloseEditor>,
}

impl Notifier {
    pub fn new(
        on_notify: Option<OnNotify>,
        on_progress: Option<OnProgress>,
        on_close_editor: Option<OnCloseEditor>,
    ) -> Self {
        Self {
            on_notify,
            on_progress,
            on_close_editor,
        }
    }

    pub fn notify(&self, notification: Notification) {
        #[cfg(feature = "tracing")]
        match notification.kind {
            NotificationKind::Success => info!("{}", notification.message),
            NotificationKind::Error => warn!("{}", notification.message),
        }
        if let Some(on_notify) = &self.on_notify {
            (on_notify.0.lock())(notification);
        }
    }

    pub fn success<T: Into<String>>(&self, message: T) {
        self.notify(Notification::success(message));
    }

    pub fn error<T: Into<String>>(&self, message: T) {
        self.notify(Notification::error(message));
    }

    pub fn progress(&self, busy: bool) {
        #[cfg(feature = "tracing")]
        debug!("In-progress indicator: {busy}");
        if let Some(on_progress) = &self.on_progress {
            (on_progress.0.lock())(busy);
        }
    }

    pub fn close_editor(&self) {
        if let Some(on_close_editor) = &self.on_close_editor {
            (on_close_editor.0.lock())();
        }
    }
}
