use std::sync::{Arc, PoisonError, RwLock};

use mailtrack_common::{CapturedMessage, capture};

use crate::{listener::CaptureListener, mailer::Mailer};

/// Every email sent while a test runs, in the order it was sent.
///
/// The outbox is owned by the test. It starts out empty, only ever grows
/// through its [`CaptureListener`], and is gone with the test.
///
/// ```
/// use mailtrack::{MailAssertions, Mailer, MessageBuilder, NullTransport, Outbox};
///
/// let mut mailer = Mailer::new(NullTransport);
/// let outbox = Outbox::track(&mut mailer);
///
/// mailer
///     .send(&MessageBuilder::new().to("a@x.com").subject("Hi").build().unwrap())
///     .unwrap();
///
/// outbox.assert_count_sent(1).assert_last_subject_equals("Hi");
/// ```
#[derive(Debug, Default)]
pub struct Outbox {
    emails: Arc<RwLock<Vec<CapturedMessage>>>,
}

impl Outbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an outbox and register its listener with `mailer`.
    pub fn track(mailer: &mut Mailer) -> Self {
        let outbox = Self::new();
        mailer.register_plugin(Arc::new(outbox.listener()));
        capture!("Tracking outgoing mail");
        outbox
    }

    /// A listener feeding this outbox, to register with a mailer.
    #[must_use]
    pub fn listener(&self) -> CaptureListener {
        CaptureListener::new(Arc::downgrade(&self.emails))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.emails
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A snapshot of the captured emails
    #[must_use]
    pub fn emails(&self) -> Vec<CapturedMessage> {
        self.emails
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recently captured email
    #[must_use]
    pub fn last(&self) -> Option<CapturedMessage> {
        self.emails
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}
