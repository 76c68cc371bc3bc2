//! mboxrd: every message is introduced by a `From <sender> <asctime>` line
//! and followed by a blank line. Body lines matching `^>*From ` get one extra
//! `>` on write, which the parser removes again.

use std::io::{self, Write};

use chrono::{DateTime, NaiveDateTime, Utc};
use mailtrack_common::CapturedMessage;

use super::{Entry, LogParser, is_blank, lines, unquoted};
use crate::error::SourceError;

const POSTMARK_DATE: &str = "%a %b %e %H:%M:%S %Y";

#[derive(Clone, Copy, Debug, Default)]
pub struct MboxParser;

impl LogParser for MboxParser {
    fn parse(&self, contents: &[u8]) -> Result<Vec<CapturedMessage>, SourceError> {
        let mut entries: Vec<Entry> = Vec::new();

        for (number, line) in lines(contents) {
            if line.starts_with(b"From ") {
                entries.push(Entry {
                    line: number,
                    logged_at: postmark_date(line),
                    raw: Vec::new(),
                });
            } else if let Some(entry) = entries.last_mut() {
                let line = if is_quoted_from(line) {
                    &line[1..]
                } else {
                    line
                };
                entry.raw.extend_from_slice(line);
            } else if !is_blank(line) {
                return Err(SourceError::Malformed {
                    line: number,
                    reason: "expected a `From ` separator line".to_string(),
                });
            }
        }

        entries
            .into_iter()
            .map(|mut entry| {
                strip_separator(&mut entry.raw);
                entry.into_message()
            })
            .collect()
    }
}

pub(crate) fn write_entry(
    writer: &mut impl Write,
    sender: Option<&str>,
    at: DateTime<Utc>,
    raw: &[u8],
) -> io::Result<()> {
    writeln!(
        writer,
        "From {} {}",
        sender.unwrap_or("MAILER-DAEMON"),
        at.format(POSTMARK_DATE)
    )?;

    for line in raw.split_inclusive(|byte| *byte == b'\n') {
        if unquoted(line).starts_with(b"From ") {
            writer.write_all(b">")?;
        }
        writer.write_all(line)?;
    }

    // Entry terminator, then the blank line separating messages
    writer.write_all(b"\n\n")
}

/// `>From `, `>>From `, ... in a body
fn is_quoted_from(line: &[u8]) -> bool {
    line.starts_with(b">") && unquoted(line).starts_with(b"From ")
}

fn postmark_date(line: &[u8]) -> Option<DateTime<Utc>> {
    let line = std::str::from_utf8(line).ok()?;
    let (_, date) = line.strip_prefix("From ")?.trim_start().split_once(' ')?;

    NaiveDateTime::parse_from_str(date.trim(), POSTMARK_DATE)
        .ok()
        .map(|at| at.and_utc())
}

/// Drop the blank line that separates one message from the next.
fn strip_separator(raw: &mut Vec<u8>) {
    if !raw.ends_with(b"\n") {
        return;
    }

    let end = raw.len() - 1;
    let start = raw[..end]
        .iter()
        .rposition(|byte| *byte == b'\n')
        .map_or(0, |index| index + 1);

    if is_blank(&raw[start..]) {
        raw.truncate(start);
    }
}

#[cfg(test)]
mod test {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::{MboxParser, write_entry};
    use crate::{error::SourceError, format::LogParser};

    #[test]
    fn parse_mailbox() {
        let mbox = b"From a@x.com Sun May 19 12:30:00 2024\n\
                     From: a@x.com\n\
                     To: b@x.com\n\
                     Subject: First\n\
                     \n\
                     >From the desk of A\n\
                     \n\
                     From MAILER-DAEMON Sun May 19 12:31:00 2024\n\
                     To: c@x.com\n\
                     Subject: Second\n\
                     \n\
                     Two\n\
                     \n";

        let messages = MboxParser.parse(mbox).unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].subject(), "First");
        assert_eq!(messages[0].body(), "From the desk of A");
        assert_eq!(
            messages[0].logged_at(),
            Some(Utc.with_ymd_and_hms(2024, 5, 19, 12, 30, 0).unwrap())
        );
        assert!(messages[1].recipients().contains("c@x.com"));
        assert_eq!(messages[1].body(), "Two");
    }

    #[test]
    fn unparseable_postmark_date_is_ignored() {
        let messages = MboxParser
            .parse(b"From someone yesterday\nSubject: Hi\n\nBody\n")
            .unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].logged_at(), None);
    }

    #[test]
    fn parse_rejects_missing_separator() {
        let result = MboxParser.parse(b"Subject: Hi\n\nBody\n");

        assert!(matches!(result, Err(SourceError::Malformed { line: 1, .. })));
    }

    #[test]
    fn written_entries_parse_back() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 9, 15, 0).unwrap();
        let mut mbox = Vec::new();

        write_entry(
            &mut mbox,
            Some("a@x.com"),
            at,
            b"From: a@x.com\r\nTo: b@x.com\r\nSubject: One\r\n\r\nFrom here on\r\n>From there\r\n",
        )
        .unwrap();
        write_entry(&mut mbox, None, at, b"To: c@x.com\r\nSubject: Two\r\n\r\nSecond").unwrap();

        assert!(mbox.starts_with(b"From a@x.com Mon Oct 19 09:15:00 2026\n"));
        assert!(
            mbox.windows(14).any(|window| window == b"\n>From here on"),
            "body From lines are quoted"
        );

        let messages = MboxParser.parse(&mbox).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].body(), "From here on\r\n>From there\r\n");
        assert_eq!(messages[0].logged_at(), Some(at));
        assert_eq!(messages[1].subject(), "Two");
        assert_eq!(messages[1].body(), "Second");
    }
}
