//! Where the [`Mailer`](crate::mailer::Mailer) hands messages once every
//! plugin has seen them. None of these deliver anything.

use std::{
    fs::OpenOptions,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::Utc;
use mailtrack_common::transport;

use crate::{
    error::TransportError,
    format::{LogFormat, mbox, monolog},
    message::OutgoingMessage,
};

pub trait Transport: Send + Sync {
    /// # Errors
    ///
    /// If the transport is unable to accept the message.
    fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError>;
}

/// Logs the envelope and drops the message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        transport!(
            level = DEBUG,
            "Discarding message: from=<{}> to=<{}>",
            message.envelope_sender().unwrap_or_default(),
            message.envelope_recipients().join(", ")
        );

        Ok(())
    }
}

/// Appends every message to a log file instead of sending it.
///
/// The file can be read back with a
/// [`LogMailSource`](crate::source::LogMailSource) using the same
/// [`LogFormat`].
#[derive(Debug, Clone)]
pub struct LogTransport {
    path: PathBuf,
    format: LogFormat,
    channel: String,
}

impl LogTransport {
    pub fn new(path: impl Into<PathBuf>, format: LogFormat) -> Self {
        Self {
            path: path.into(),
            format,
            channel: String::from("testing"),
        }
    }

    /// Channel name written in front of `Monolog` entries
    #[must_use]
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub const fn format(&self) -> LogFormat {
        self.format
    }
}

impl Transport for LogTransport {
    fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        let write_error = |source| TransportError::Write {
            path: self.path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(write_error)?;
        let mut writer = BufWriter::new(file);
        let now = Utc::now();

        match self.format {
            LogFormat::Monolog => {
                monolog::write_entry(&mut writer, &self.channel, now, message.raw())
            }
            LogFormat::Mbox => {
                mbox::write_entry(&mut writer, message.envelope_sender(), now, message.raw())
            }
        }
        .and_then(|()| writer.flush())
        .map_err(write_error)?;

        transport!(
            level = DEBUG,
            "Logged message for <{}> to {}",
            message.envelope_recipients().join(", "),
            self.path.display()
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageBuilder;

    fn message() -> OutgoingMessage {
        MessageBuilder::new()
            .from("sender@example.com")
            .to("recipient@example.com")
            .subject("Logged")
            .body("Hello")
            .build()
            .unwrap()
    }

    #[test]
    fn test_null_transport_accepts_everything() {
        assert!(NullTransport.send(&message()).is_ok());
    }

    #[test]
    fn test_log_transport_appends() {
        let dir = tempfile::tempdir().unwrap();
        let transport = LogTransport::new(dir.path().join("mail.log"), LogFormat::Monolog)
            .with_channel("local");

        transport.send(&message()).unwrap();
        transport.send(&message()).unwrap();

        let contents = std::fs::read_to_string(transport.path()).unwrap();
        assert_eq!(contents.matches("] local.DEBUG: ").count(), 2);
        assert!(contents.contains("Subject: Logged"));
    }

    #[test]
    fn test_log_transport_mbox_uses_envelope_sender() {
        let dir = tempfile::tempdir().unwrap();
        let transport = LogTransport::new(dir.path().join("mail.mbox"), LogFormat::Mbox);

        transport.send(&message()).unwrap();

        let contents = std::fs::read_to_string(transport.path()).unwrap();
        assert!(contents.starts_with("From sender@example.com "));
    }

    #[test]
    fn test_log_transport_reports_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("mail.log");
        let transport = LogTransport::new(&path, LogFormat::Monolog);

        let err = transport.send(&message()).unwrap_err();

        assert!(matches!(&err, TransportError::Write { path: failed, .. } if *failed == path));
    }
}
