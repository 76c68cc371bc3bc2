use std::sync::{PoisonError, RwLock, Weak};

use mailtrack_common::{CapturedMessage, capture};

use crate::mailer::{EventListener, SendEvent};

/// Plugin that copies every outgoing message into an
/// [`Outbox`](crate::outbox::Outbox).
///
/// Only a weak reference to the outbox is held: once the test owning the
/// outbox drops it, further sends through the same mailer are ignored.
#[derive(Debug, Clone)]
pub struct CaptureListener {
    emails: Weak<RwLock<Vec<CapturedMessage>>>,
}

impl CaptureListener {
    pub(crate) const fn new(emails: Weak<RwLock<Vec<CapturedMessage>>>) -> Self {
        Self { emails }
    }
}

impl EventListener for CaptureListener {
    /// Whether the outbox this listener feeds still exists
    fn is_attached(&self) -> bool {
        self.emails.strong_count() > 0
    }

    fn before_send(&self, event: &SendEvent<'_>) {
        let Some(emails) = self.emails.upgrade() else {
            capture!("Outbox is gone, ignoring message");
            return;
        };

        let message = event.message().message().clone();
        let mut emails = emails.write().unwrap_or_else(PoisonError::into_inner);
        emails.push(message);

        capture!(level = DEBUG, "Captured email #{}", emails.len());
    }
}
