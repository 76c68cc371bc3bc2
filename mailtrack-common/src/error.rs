//! Error types for the mailtrack-common crate.

use thiserror::Error;

/// Errors that can occur while turning raw message bytes into a
/// [`CapturedMessage`](crate::CapturedMessage).
#[derive(Debug, Error)]
pub enum MessageError {
    /// The message could not be parsed as RFC 5322 / MIME.
    #[error("Unable to parse message: {0}")]
    Parse(#[from] mailparse::MailParseError),

    /// An address header was present but malformed.
    #[error("Invalid {header} header: {source}")]
    InvalidAddress {
        header: &'static str,
        #[source]
        source: mailparse::MailParseError,
    },
}
