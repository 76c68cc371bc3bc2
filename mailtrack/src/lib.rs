//! Capture the email an application sends during its tests, and assert on it.
//!
//! Register an [`Outbox`] with the application's [`Mailer`], or point a
//! [`LogMailSource`] at the log a [`LogTransport`] writes, then use the
//! [`MailAssertions`] every capture source gets.

pub mod assertions;
pub mod config;
pub mod error;
pub mod format;
pub mod listener;
pub mod mailer;
pub mod message;
pub mod outbox;
pub mod source;
pub mod transport;

pub use assertions::MailAssertions;
pub use config::{LogConfig, TrackingConfig};
pub use error::{AssertionError, BuilderError, ConfigError, SourceError, TransportError};
pub use format::{LogFormat, LogParser, MboxParser, MonologParser};
pub use listener::CaptureListener;
pub use mailer::{Event, EventListener, Mailer, SendEvent};
pub use mailtrack_common::{AddressMap, CapturedMessage, Mailbox, Recipients};
pub use message::{Attachment, MessageBuilder, OutgoingMessage, TransferEncoding};
pub use outbox::Outbox;
pub use source::{CaptureSource, LogMailSource};
pub use transport::{LogTransport, NullTransport, Transport};
