//! Composing outgoing messages.

use std::{io::Write, path::Path};

use mailtrack_common::CapturedMessage;

use crate::error::BuilderError;

pub type Result<T> = std::result::Result<T, BuilderError>;

/// How the text body is written on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransferEncoding {
    /// Written as-is.
    #[default]
    EightBit,
    QuotedPrintable,
    Base64,
}

impl TransferEncoding {
    const fn header(self) -> &'static str {
        match self {
            Self::EightBit => "8bit",
            Self::QuotedPrintable => "quoted-printable",
            Self::Base64 => "base64",
        }
    }

    fn encode(self, body: &str) -> String {
        match self {
            Self::EightBit => body.to_string(),
            Self::QuotedPrintable => {
                let encoded = quoted_printable::encode(crlf(body));
                String::from_utf8_lossy(&encoded).into_owned()
            }
            Self::Base64 => wrap(&base64_encode(body.as_bytes())),
        }
    }
}

/// Bare `\n` line breaks become `\r\n`, which quoted-printable keeps as hard
/// line breaks.
fn crlf(body: &str) -> String {
    body.replace("\r\n", "\n").replace('\n', "\r\n")
}

/// An email attachment with filename, content type, and data.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// The filename to use in the MIME header.
    pub filename: String,
    /// The MIME content type (e.g., "application/pdf").
    pub content_type: String,
    /// The attachment data.
    pub data: Vec<u8>,
}

/// A fully composed message, ready to be handed to a
/// [`Mailer`](crate::mailer::Mailer).
///
/// Besides the message itself this carries the envelope: the addresses the
/// transport would actually deliver to, which includes `Bcc` recipients that
/// never appear in the headers.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    envelope_sender: Option<String>,
    envelope_recipients: Vec<String>,
    message: CapturedMessage,
}

impl OutgoingMessage {
    /// Wrap an already encoded RFC 5322 message.
    ///
    /// The envelope is derived from the `From`, `To` and `Cc` headers.
    ///
    /// # Errors
    ///
    /// If the message cannot be parsed.
    pub fn from_raw(raw: impl Into<Vec<u8>>) -> Result<Self> {
        let message = CapturedMessage::parse(raw)?;
        let envelope_sender = message.sender().addresses().next().map(str::to_string);
        let envelope_recipients = message
            .recipients()
            .addresses()
            .chain(message.cc().addresses())
            .map(str::to_string)
            .collect();

        Ok(Self {
            envelope_sender,
            envelope_recipients,
            message,
        })
    }

    #[inline]
    pub fn envelope_sender(&self) -> Option<&str> {
        self.envelope_sender.as_deref()
    }

    #[inline]
    pub fn envelope_recipients(&self) -> &[String] {
        &self.envelope_recipients
    }

    #[inline]
    pub const fn message(&self) -> &CapturedMessage {
        &self.message
    }

    #[inline]
    pub fn raw(&self) -> &[u8] {
        self.message.raw()
    }
}

/// Builder for constructing email messages with proper MIME formatting.
///
/// This builder handles:
/// - Email headers (From, To, Cc, Subject and custom ones)
/// - A plain text body in the chosen [`TransferEncoding`]
/// - File attachments with automatic MIME multipart encoding
/// - `Bcc` recipients, which only end up in the envelope
///
/// # Examples
///
/// ```
/// use mailtrack::message::{MessageBuilder, TransferEncoding};
///
/// let message = MessageBuilder::new()
///     .from("sender@example.com")
///     .to("recipient@example.com")
///     .subject("Hello")
///     .body("This is the message body")
///     .transfer_encoding(TransferEncoding::QuotedPrintable)
///     .build()
///     .unwrap();
///
/// assert_eq!(message.message().subject(), "Hello");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    from: Option<String>,
    to: Vec<String>,
    cc: Vec<String>,
    bcc: Vec<String>,
    subject: Option<String>,
    headers: Vec<(String, String)>,
    body: Option<String>,
    encoding: TransferEncoding,
    attachments: Vec<Attachment>,
}

impl MessageBuilder {
    /// Creates a new empty message builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the From header.
    #[must_use]
    pub fn from(mut self, email: impl Into<String>) -> Self {
        self.from = Some(email.into());
        self
    }

    /// Adds a recipient to the To header.
    #[must_use]
    pub fn to(mut self, email: impl Into<String>) -> Self {
        self.to.push(email.into());
        self
    }

    /// Adds multiple recipients to the To header.
    #[must_use]
    pub fn to_multiple(mut self, emails: &[impl AsRef<str>]) -> Self {
        self.to
            .extend(emails.iter().map(|email| email.as_ref().to_string()));
        self
    }

    /// Adds a recipient to the Cc header.
    #[must_use]
    pub fn cc(mut self, email: impl Into<String>) -> Self {
        self.cc.push(email.into());
        self
    }

    /// Adds a blind recipient; it is delivered to but never written to a header.
    #[must_use]
    pub fn bcc(mut self, email: impl Into<String>) -> Self {
        self.bcc.push(email.into());
        self
    }

    /// Sets the Subject header.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Adds a custom header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the message body content.
    #[must_use]
    pub fn body(mut self, content: impl Into<String>) -> Self {
        self.body = Some(content.into());
        self
    }

    #[must_use]
    pub fn transfer_encoding(mut self, encoding: TransferEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Adds a file attachment from raw data.
    #[must_use]
    pub fn attach(
        mut self,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        self.attachments.push(Attachment {
            filename: filename.into(),
            content_type: content_type.into(),
            data,
        });
        self
    }

    /// Adds a file attachment by reading from the filesystem.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn attach_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| BuilderError::Attachment(format!("{} has no filename", path.display())))?
            .to_string();

        let data = std::fs::read(path)?;
        let content_type = guess_content_type(path);

        self.attachments.push(Attachment {
            filename,
            content_type,
            data,
        });

        Ok(self)
    }

    /// Builds the final email message with proper MIME formatting.
    ///
    /// # Errors
    ///
    /// Returns an error if there is nobody to send to, a header value would
    /// break the header block, or the result cannot be parsed back.
    pub fn build(self) -> Result<OutgoingMessage> {
        if self.to.is_empty() && self.cc.is_empty() && self.bcc.is_empty() {
            return Err(BuilderError::NoRecipients);
        }

        let mut message = Vec::with_capacity(1024);
        self.write_headers(&mut message)?;

        if self.attachments.is_empty() {
            self.write_simple(&mut message)?;
        } else {
            self.write_multipart(&mut message)?;
        }

        let message = CapturedMessage::parse(message)?;
        let envelope_recipients = self
            .to
            .iter()
            .chain(&self.cc)
            .chain(&self.bcc)
            .filter_map(|recipient| mailparse::addrparse(recipient).ok())
            .flat_map(|list| {
                mailtrack_common::AddressMap::from(&list)
                    .addresses()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();

        let envelope_sender = message.sender().addresses().next().map(str::to_string);

        Ok(OutgoingMessage {
            envelope_sender,
            envelope_recipients,
            message,
        })
    }

    fn write_headers(&self, message: &mut Vec<u8>) -> Result<()> {
        let mut header = |name: &str, value: &str| -> Result<()> {
            if value.contains(['\r', '\n']) {
                return Err(BuilderError::HeaderInjection(name.to_string()));
            }
            write!(message, "{name}: {value}\r\n")?;
            Ok(())
        };

        if let Some(from) = &self.from {
            header("From", from)?;
        }

        if !self.to.is_empty() {
            header("To", &self.to.join(", "))?;
        }

        if !self.cc.is_empty() {
            header("Cc", &self.cc.join(", "))?;
        }

        if let Some(subject) = &self.subject {
            header("Subject", &encode_word(subject))?;
        }

        for (name, value) in &self.headers {
            header(name, value)?;
        }

        header("MIME-Version", "1.0")
    }

    fn write_simple(&self, message: &mut Vec<u8>) -> Result<()> {
        write!(message, "Content-Type: text/plain; charset=utf-8\r\n")?;
        write!(
            message,
            "Content-Transfer-Encoding: {}\r\n",
            self.encoding.header()
        )?;

        // Blank line between headers and body
        write!(message, "\r\n")?;

        if let Some(body) = &self.body {
            write!(message, "{}", self.encoding.encode(body))?;
        }

        Ok(())
    }

    fn write_multipart(&self, message: &mut Vec<u8>) -> Result<()> {
        let boundary = generate_boundary();

        write!(
            message,
            "Content-Type: multipart/mixed; boundary=\"{boundary}\"\r\n"
        )?;
        write!(message, "\r\n")?;

        write!(message, "--{boundary}\r\n")?;
        self.write_simple(message)?;
        write!(message, "\r\n")?;

        for attachment in &self.attachments {
            write!(message, "--{boundary}\r\n")?;
            write!(message, "Content-Type: {}\r\n", attachment.content_type)?;
            write!(message, "Content-Transfer-Encoding: base64\r\n")?;
            write!(
                message,
                "Content-Disposition: attachment; filename=\"{}\"\r\n",
                attachment.filename
            )?;
            write!(message, "\r\n")?;
            write!(message, "{}", wrap(&base64_encode(&attachment.data)))?;
        }

        write!(message, "--{boundary}--\r\n")?;

        Ok(())
    }
}

/// Generates a unique MIME boundary string.
fn generate_boundary() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();

    format!("----=_Part_{timestamp}")
}

/// RFC 2047 encoded-word for header values that are not plain ASCII.
fn encode_word(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?utf-8?B?{}?=", base64_encode(value.as_bytes()))
    }
}

fn base64_encode(data: &[u8]) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut result = String::with_capacity(data.len().div_ceil(3) * 4);

    for chunk in data.chunks(3) {
        let mut buf = [0u8; 3];
        buf[..chunk.len()].copy_from_slice(chunk);

        let b1 = (buf[0] >> 2) as usize;
        let b2 = (((buf[0] & 0x03) << 4) | (buf[1] >> 4)) as usize;
        let b3 = (((buf[1] & 0x0F) << 2) | (buf[2] >> 6)) as usize;
        let b4 = (buf[2] & 0x3F) as usize;

        result.push(ALPHABET[b1] as char);
        result.push(ALPHABET[b2] as char);
        result.push(if chunk.len() > 1 {
            ALPHABET[b3] as char
        } else {
            '='
        });
        result.push(if chunk.len() > 2 {
            ALPHABET[b4] as char
        } else {
            '='
        });
    }

    result
}

/// Break an encoded body into 76 character lines.
fn wrap(encoded: &str) -> String {
    let mut result = String::with_capacity(encoded.len() + encoded.len() / 38 + 2);

    for line in encoded.as_bytes().chunks(76) {
        // base64 output is ASCII
        result.push_str(&String::from_utf8_lossy(line));
        result.push_str("\r\n");
    }

    result
}

/// Guesses the MIME content type based on file extension.
fn guess_content_type(path: &Path) -> String {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match extension.to_lowercase().as_str() {
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "csv" => "text/csv",
        "json" => "application/json",
        "ics" => "text/calendar",
        _ => "application/octet-stream",
    }
    .to_string()
}
