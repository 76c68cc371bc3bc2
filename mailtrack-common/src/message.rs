use std::fmt::{self, Debug};

use chrono::{DateTime, Utc};
use mailparse::{MailHeaderMap, ParsedMail};

use crate::{address::AddressMap, error::MessageError};

/// An outgoing email as seen by a capture source.
///
/// Once built the message never changes; the raw bytes it was parsed from are
/// kept alongside the extracted fields so encoding-specific checks can go
/// back to the source.
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedMessage {
    sender: AddressMap,
    recipients: AddressMap,
    cc: AddressMap,
    subject: String,
    body: String,
    headers: Vec<(String, String)>,
    raw: Vec<u8>,
    logged_at: Option<DateTime<Utc>>,
}

impl Debug for CapturedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedMessage")
            .field("sender", &self.sender.to_string())
            .field("recipients", &self.recipients.to_string())
            .field("subject", &self.subject)
            .field("body", &self.body)
            .field("logged_at", &self.logged_at)
            .finish_non_exhaustive()
    }
}

impl CapturedMessage {
    ///
    /// Parse a raw RFC 5322 message into its sender, recipients, subject and
    /// decoded body.
    ///
    /// Transfer encodings (quoted-printable, base64) and charsets are decoded
    /// before the body is stored. For multipart messages the first
    /// `text/plain` part wins, then the first `text/*` part.
    ///
    /// # Errors
    ///
    /// If the message cannot be parsed, or an address header is malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use mailtrack_common::CapturedMessage;
    ///
    /// let message = CapturedMessage::parse(
    ///     b"From: a@x.com\r\nTo: b@x.com\r\nSubject: Hi\r\n\
    ///       Content-Transfer-Encoding: quoted-printable\r\n\r\nHello=20World\r\n".to_vec(),
    /// )
    /// .unwrap();
    ///
    /// assert!(message.recipients().contains("b@x.com"));
    /// assert_eq!(message.subject(), "Hi");
    /// assert!(message.body().contains("Hello World"));
    /// ```
    ///
    pub fn parse(raw: impl Into<Vec<u8>>) -> Result<Self, MessageError> {
        let raw = raw.into();
        let parsed = mailparse::parse_mail(&raw)?;

        let sender = addresses(&parsed, "From")?;
        let recipients = addresses(&parsed, "To")?;
        let cc = addresses(&parsed, "Cc")?;
        let subject = parsed
            .get_headers()
            .get_first_value("Subject")
            .unwrap_or_default();
        let headers = parsed
            .headers
            .iter()
            .map(|header| (header.get_key(), header.get_value()))
            .collect();
        let body = text_body(&parsed)?.unwrap_or_default();

        Ok(Self {
            sender,
            recipients,
            cc,
            subject,
            body,
            headers,
            raw,
            logged_at: None,
        })
    }

    /// Record when a log transport wrote this message
    #[must_use]
    pub fn with_logged_at(mut self, at: DateTime<Utc>) -> Self {
        self.logged_at = Some(at);
        self
    }

    #[inline]
    pub const fn sender(&self) -> &AddressMap {
        &self.sender
    }

    /// The `To` recipients of this message
    #[inline]
    pub const fn recipients(&self) -> &AddressMap {
        &self.recipients
    }

    #[inline]
    pub const fn cc(&self) -> &AddressMap {
        &self.cc
    }

    #[inline]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The decoded text body
    #[inline]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The message exactly as the transport handed it over
    #[inline]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    #[inline]
    pub const fn logged_at(&self) -> Option<DateTime<Utc>> {
        self.logged_at
    }

    /// First decoded value of the header `name` (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

fn addresses(parsed: &ParsedMail<'_>, header: &'static str) -> Result<AddressMap, MessageError> {
    parsed
        .get_headers()
        .get_first_header(header)
        .map_or_else(
            || Ok(AddressMap::default()),
            |value| {
                mailparse::addrparse_header(value)
                    .map(|list| AddressMap::from(&list))
                    .map_err(|source| MessageError::InvalidAddress { header, source })
            },
        )
}

fn text_body(parsed: &ParsedMail<'_>) -> Result<Option<String>, MessageError> {
    let part = find_part(parsed, &|mimetype: &str| mimetype.eq_ignore_ascii_case("text/plain"))
        .or_else(|| find_part(parsed, &|mimetype: &str| mimetype.starts_with("text/")));

    Ok(part.map(|part| part.get_body()).transpose()?)
}

fn find_part<'a, 'buf>(
    part: &'a ParsedMail<'buf>,
    matches: &dyn Fn(&str) -> bool,
) -> Option<&'a ParsedMail<'buf>> {
    if part.subparts.is_empty() {
        return matches(&part.ctype.mimetype).then_some(part);
    }

    part.subparts
        .iter()
        .find_map(|subpart| find_part(subpart, matches))
}

#[cfg(test)]
mod test {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::CapturedMessage;

    #[test]
    fn parse_plain_message() {
        let message = CapturedMessage::parse(
            b"From: Sender <sender@example.com>\r\n\
              To: a@example.com, B <b@example.com>\r\n\
              Cc: c@example.com\r\n\
              Subject: Welcome aboard\r\n\
              X-Mailer: mailtrack\r\n\
              \r\n\
              Hello there.\r\n"
                .to_vec(),
        )
        .unwrap();

        assert!(message.sender().contains("sender@example.com"));
        assert_eq!(message.sender().display_name("sender@example.com"), Some("Sender"));
        assert_eq!(
            message.recipients().addresses().collect::<Vec<_>>(),
            vec!["a@example.com", "b@example.com"]
        );
        assert!(message.cc().contains("c@example.com"));
        assert!(!message.recipients().contains("c@example.com"));
        assert_eq!(message.subject(), "Welcome aboard");
        assert_eq!(message.body().trim_end(), "Hello there.");
        assert_eq!(message.header("x-mailer"), Some("mailtrack"));
        assert_eq!(message.logged_at(), None);
    }

    #[test]
    fn parse_decodes_quoted_printable() {
        let message = CapturedMessage::parse(
            b"To: a@x.com\r\n\
              Subject: Hi\r\n\
              Content-Type: text/plain; charset=utf-8\r\n\
              Content-Transfer-Encoding: quoted-printable\r\n\
              \r\n\
              Hello=20World, caf=C3=A9\r\n"
                .to_vec(),
        )
        .unwrap();

        assert!(message.body().contains("Hello World, café"));
        assert!(!message.body().contains("=20"));
        assert!(
            String::from_utf8_lossy(message.raw()).contains("Hello=20World"),
            "raw bytes are passed through untouched"
        );
    }

    #[test]
    fn parse_decodes_base64() {
        let message = CapturedMessage::parse(
            b"To: a@x.com\r\n\
              Content-Transfer-Encoding: base64\r\n\
              \r\n\
              SGVsbG8gV29ybGQ=\r\n"
                .to_vec(),
        )
        .unwrap();

        assert_eq!(message.body(), "Hello World");
    }

    #[test]
    fn parse_multipart_prefers_plain_text() {
        let message = CapturedMessage::parse(
            b"To: a@x.com\r\n\
              Subject: Multi\r\n\
              MIME-Version: 1.0\r\n\
              Content-Type: multipart/alternative; boundary=\"sep\"\r\n\
              \r\n\
              --sep\r\n\
              Content-Type: text/html\r\n\
              \r\n\
              <p>Rich</p>\r\n\
              --sep\r\n\
              Content-Type: text/plain\r\n\
              \r\n\
              Plain\r\n\
              --sep--\r\n"
                .to_vec(),
        )
        .unwrap();

        assert_eq!(message.body().trim_end(), "Plain");
    }

    #[test]
    fn parse_without_headers_yields_empty_fields() {
        let message = CapturedMessage::parse(b"\r\nJust a body".to_vec()).unwrap();

        assert!(message.sender().is_empty());
        assert!(message.recipients().is_empty());
        assert_eq!(message.subject(), "");
        assert_eq!(message.body(), "Just a body");
    }

    #[test]
    fn logged_at_is_recorded() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let message = CapturedMessage::parse(b"To: a@x.com\r\n\r\nHi".to_vec())
            .unwrap()
            .with_logged_at(at);

        assert_eq!(message.logged_at(), Some(at));
    }
}
