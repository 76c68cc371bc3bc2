//! Where the assertion layer gets its sent mail from.
//!
//! - [`Outbox`]: pushed to live by a [`CaptureListener`](crate::CaptureListener)
//! - [`LogMailSource`]: pulled from a log file on every read

use mailtrack_common::CapturedMessage;

use crate::{error::SourceError, outbox::Outbox};

pub mod log;

pub use log::LogMailSource;

/// Anything that can list the emails sent so far, oldest first.
pub trait CaptureSource {
    /// # Errors
    ///
    /// If the underlying store cannot be read.
    fn sent_emails(&self) -> Result<Vec<CapturedMessage>, SourceError>;
}

impl CaptureSource for Outbox {
    fn sent_emails(&self) -> Result<Vec<CapturedMessage>, SourceError> {
        Ok(self.emails())
    }
}
