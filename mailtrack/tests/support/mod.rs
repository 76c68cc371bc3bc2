//! Shared fixture for the integration tests.
//!
//! [`MailTest`] plays the part of an application test case: it owns the
//! mailer under test and the outbox tracking it, and is itself a
//! [`CaptureSource`] so assertions can be called on it directly.

#![allow(dead_code)]

use mailtrack::{
    CaptureSource, CapturedMessage, Mailer, MessageBuilder, NullTransport, Outbox, SourceError,
    TransferEncoding, Transport,
};

pub struct MailTest {
    mailer: Mailer,
    outbox: Outbox,
}

impl MailTest {
    pub fn new() -> Self {
        Self::with_transport(NullTransport)
    }

    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        mailtrack_common::logging::init();

        let mut mailer = Mailer::new(transport);
        let outbox = Outbox::track(&mut mailer);

        Self { mailer, outbox }
    }

    pub fn mailer(&self) -> &Mailer {
        &self.mailer
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    pub fn send(&self, to: &str, subject: &str, body: &str) {
        let message = MessageBuilder::new()
            .from("app@example.com")
            .to(to)
            .subject(subject)
            .body(body)
            .transfer_encoding(TransferEncoding::QuotedPrintable)
            .build()
            .expect("valid message");

        self.mailer.send(&message).expect("message sent");
    }
}

impl CaptureSource for MailTest {
    fn sent_emails(&self) -> Result<Vec<CapturedMessage>, SourceError> {
        self.outbox.sent_emails()
    }
}
