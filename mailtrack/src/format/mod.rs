//! On-disk formats used by [`LogTransport`](crate::transport::LogTransport)
//! and read back by [`LogMailSource`](crate::source::LogMailSource).
//!
//! Each format is a writer paired with a [`LogParser`]. Parsers are the
//! replaceable half: a log written by some other transport can be read by
//! implementing [`LogParser`] for it.

use chrono::{DateTime, Utc};
use mailtrack_common::CapturedMessage;
use serde::Deserialize;

use crate::error::SourceError;

pub mod mbox;
pub mod monolog;

pub use mbox::MboxParser;
pub use monolog::MonologParser;

/// Turns the contents of a mail log into captured messages, oldest first.
pub trait LogParser {
    /// # Errors
    ///
    /// If an entry is malformed or does not contain a valid message.
    fn parse(&self, contents: &[u8]) -> Result<Vec<CapturedMessage>, SourceError>;
}

/// The formats shipped with this crate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub enum LogFormat {
    /// `[timestamp] channel.LEVEL: <message>` entries.
    #[default]
    Monolog,
    /// mboxrd: messages separated by `From ` lines.
    Mbox,
}

impl LogParser for LogFormat {
    fn parse(&self, contents: &[u8]) -> Result<Vec<CapturedMessage>, SourceError> {
        match self {
            Self::Monolog => MonologParser.parse(contents),
            Self::Mbox => MboxParser.parse(contents),
        }
    }
}

/// A raw entry cut out of a log, before it is parsed as a message.
#[derive(Debug, Default)]
struct Entry {
    line: usize,
    logged_at: Option<DateTime<Utc>>,
    raw: Vec<u8>,
}

impl Entry {
    fn into_message(mut self) -> Result<CapturedMessage, SourceError> {
        strip_terminator(&mut self.raw);

        let message = CapturedMessage::parse(self.raw).map_err(|source| SourceError::Message {
            line: self.line,
            source,
        })?;

        Ok(match self.logged_at {
            Some(at) => message.with_logged_at(at),
            None => message,
        })
    }
}

/// Lines including their terminators, numbered from 1.
fn lines(contents: &[u8]) -> impl Iterator<Item = (usize, &[u8])> {
    contents
        .split_inclusive(|byte| *byte == b'\n')
        .enumerate()
        .map(|(index, line)| (index + 1, line))
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

/// Writers end every entry with a line break of their own, so the message
/// comes back exactly as it was handed over.
fn strip_terminator(raw: &mut Vec<u8>) {
    if raw.ends_with(b"\r\n") {
        raw.truncate(raw.len() - 2);
    } else if raw.ends_with(b"\n") {
        raw.pop();
    }
}

/// `line` without its leading `>` escapes
fn unquoted(line: &[u8]) -> &[u8] {
    let quotes = line.iter().take_while(|byte| **byte == b'>').count();
    &line[quotes..]
}
