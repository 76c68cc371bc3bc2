//! Monolog-style line log, as written by PHP and many other framework
//! loggers:
//!
//! ```text
//! [2024-05-01T12:30:00.000000+00:00] testing.DEBUG: From: a@x.com
//! To: b@x.com
//! Subject: Hi
//!
//! Hello
//! ```
//!
//! An entry starts at a line opening with `[timestamp] channel.LEVEL: ` and
//! runs until the next such line. The timestamp is RFC 3339 or
//! `%Y-%m-%d %H:%M:%S` (taken as UTC).
//!
//! Message lines that would read as an entry header are written with an
//! extra leading `>`, which the parser removes again.

use std::io::{self, Write};

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use mailtrack_common::CapturedMessage;

use super::{Entry, LogParser, is_blank, lines, unquoted};
use crate::error::SourceError;

#[derive(Clone, Copy, Debug, Default)]
pub struct MonologParser;

impl LogParser for MonologParser {
    fn parse(&self, contents: &[u8]) -> Result<Vec<CapturedMessage>, SourceError> {
        let mut entries: Vec<Entry> = Vec::new();

        for (number, line) in lines(contents) {
            if let Some((logged_at, first)) = entry_header(line) {
                entries.push(Entry {
                    line: number,
                    logged_at: Some(logged_at),
                    raw: first.to_vec(),
                });
            } else if let Some(entry) = entries.last_mut() {
                let line = if is_escaped_header(line) {
                    &line[1..]
                } else {
                    line
                };
                entry.raw.extend_from_slice(line);
            } else if !is_blank(line) {
                return Err(SourceError::Malformed {
                    line: number,
                    reason: "expected a `[timestamp] channel.LEVEL:` entry".to_string(),
                });
            }
        }

        entries.into_iter().map(Entry::into_message).collect()
    }
}

pub(crate) fn write_entry(
    writer: &mut impl Write,
    channel: &str,
    at: DateTime<Utc>,
    raw: &[u8],
) -> io::Result<()> {
    write!(
        writer,
        "[{}] {channel}.DEBUG: ",
        at.to_rfc3339_opts(SecondsFormat::Micros, false)
    )?;

    let mut lines = raw.split_inclusive(|byte| *byte == b'\n');
    if let Some(first) = lines.next() {
        writer.write_all(first)?;
    }

    for line in lines {
        if entry_header(unquoted(line)).is_some() {
            writer.write_all(b">")?;
        }
        writer.write_all(line)?;
    }

    writer.write_all(b"\n")
}

/// `>[timestamp] channel.LEVEL: ...`, `>>[timestamp] ...`
fn is_escaped_header(line: &[u8]) -> bool {
    line.starts_with(b">") && entry_header(unquoted(line)).is_some()
}

/// Split `[timestamp] channel.LEVEL: rest` into the timestamp and `rest`.
fn entry_header(line: &[u8]) -> Option<(DateTime<Utc>, &[u8])> {
    let rest = line.strip_prefix(b"[")?;
    let close = rest.iter().position(|byte| *byte == b']')?;
    let logged_at = parse_timestamp(std::str::from_utf8(&rest[..close]).ok()?)?;

    let rest = rest[close + 1..].strip_prefix(b" ")?;
    let colon = rest.windows(2).position(|window| window == b": ")?;
    let dot = rest[..colon].iter().rposition(|byte| *byte == b'.')?;
    let (channel, level) = (&rest[..dot], &rest[dot + 1..colon]);

    if channel.is_empty()
        || level.is_empty()
        || !level.iter().all(u8::is_ascii_uppercase)
        || channel.iter().any(u8::is_ascii_whitespace)
    {
        return None;
    }

    Some((logged_at, &rest[colon + 2..]))
}

fn parse_timestamp(timestamp: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|at| at.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|at| at.and_utc())
        })
}
