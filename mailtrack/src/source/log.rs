use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use mailtrack_common::{CapturedMessage, source};

use super::CaptureSource;
use crate::{
    error::SourceError,
    format::{LogFormat, LogParser},
};

/// Reads sent mail back out of a log written by a
/// [`LogTransport`](crate::transport::LogTransport), or any other writer a
/// [`LogParser`] understands.
///
/// The file is read again on every call, so it always reflects what has been
/// written so far. A file that does not exist yet means nothing was sent.
#[derive(Debug, Clone)]
pub struct LogMailSource<P = LogFormat> {
    path: PathBuf,
    parser: P,
}

impl<P: LogParser> LogMailSource<P> {
    pub fn new(path: impl Into<PathBuf>, parser: P) -> Self {
        Self {
            path: path.into(),
            parser,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse every message currently in the log.
    ///
    /// # Errors
    ///
    /// If the file exists but cannot be read, or the parser rejects it.
    pub fn read(&self) -> Result<Vec<CapturedMessage>, SourceError> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                source!("{} does not exist yet", self.path.display());
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(SourceError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let messages = self.parser.parse(&contents)?;
        source!(
            level = DEBUG,
            "Read {} emails from {}",
            messages.len(),
            self.path.display()
        );

        Ok(messages)
    }

    /// Empty the log, typically between tests.
    ///
    /// # Errors
    ///
    /// If the file exists and cannot be removed.
    pub fn clear(&self) -> Result<(), SourceError> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(SourceError::Read {
                path: self.path.clone(),
                source: err,
            }),
            _ => Ok(()),
        }
    }
}

impl<P: LogParser> CaptureSource for LogMailSource<P> {
    fn sent_emails(&self) -> Result<Vec<CapturedMessage>, SourceError> {
        self.read()
    }
}
