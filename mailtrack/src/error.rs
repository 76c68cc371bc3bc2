//! Error types for the mailtrack crate.
//!
//! Assertion failures are ordinary values here; the panicking assertions in
//! [`crate::assertions::MailAssertions`] turn them into test failures.

use std::{io, path::PathBuf};

use mailtrack_common::MessageError;
use thiserror::Error;

/// A failed expectation about the sent mail.
///
/// The display text is the message a failing test reports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssertionError {
    #[error("Did not expect any emails to have been sent.")]
    UnexpectedEmails,

    #[error("Expected {expected} emails to have been sent, but {actual} were.")]
    CountMismatch { expected: usize, actual: usize },

    #[error("No emails have been sent.")]
    NoneSent,

    #[error("No email was sent to {0}.")]
    NotSentTo(String),

    #[error("Email was sent to {0}. But it should not have been sent.")]
    SentTo(String),

    #[error("No email was sent from {0}.")]
    NotSentFrom(String),

    #[error("No email with a subject of {0} was found.")]
    SubjectMismatch(String),

    #[error("No email with the provided body was sent.")]
    BodyMismatch,

    #[error("No email containing the provided body was found.")]
    BodyNotFound,

    #[error("The text `{0}` was not found in the last email.")]
    ExcerptMissing(String),

    #[error("The text `{0}` was found in the last email.")]
    ExcerptPresent(String),

    /// The capture source itself could not be read.
    #[error("Unable to read sent emails: {0}")]
    Source(String),
}

/// Errors raised while composing an outgoing message.
#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("A message needs at least one recipient")]
    NoRecipients,

    #[error("Header {0} contains a line break")]
    HeaderInjection(String),

    #[error("Invalid attachment: {0}")]
    Attachment(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The composed message did not survive a round trip through the parser.
    #[error(transparent)]
    Message(#[from] MessageError),
}

/// Errors raised by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Unable to write to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Transport rejected the message: {0}")]
    Rejected(String),
}

/// Errors raised while reading messages back from a capture source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Unable to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed log entry on line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("Entry on line {line} is not a valid message: {source}")]
    Message {
        line: usize,
        #[source]
        source: MessageError,
    },
}

impl From<SourceError> for AssertionError {
    fn from(value: SourceError) -> Self {
        Self::Source(value.to_string())
    }
}

/// Errors raised while loading a [`TrackingConfig`](crate::config::TrackingConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to read configuration {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

#[cfg(test)]
mod tests {
    use std::error::Error as StdError;

    use super::*;

    #[test]
    fn test_assertion_messages() {
        assert_eq!(
            AssertionError::CountMismatch {
                expected: 2,
                actual: 1
            }
            .to_string(),
            "Expected 2 emails to have been sent, but 1 were."
        );
        assert_eq!(
            AssertionError::SentTo("a@x.com".to_string()).to_string(),
            "Email was sent to a@x.com. But it should not have been sent."
        );
        assert_eq!(
            AssertionError::ExcerptMissing("Hello".to_string()).to_string(),
            "The text `Hello` was not found in the last email."
        );
    }

    #[test]
    fn test_source_error_becomes_assertion() {
        let err = SourceError::Malformed {
            line: 3,
            reason: "missing level".to_string(),
        };

        assert_eq!(
            AssertionError::from(err),
            AssertionError::Source("Malformed log entry on line 3: missing level".to_string())
        );
    }

    #[test]
    fn test_error_source_chain() {
        let err = TransportError::Write {
            path: PathBuf::from("/tmp/mail.log"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
        };

        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "Unable to write to /tmp/mail.log: access denied");
    }
}
