//! Test-suite configuration, loaded from RON.
//!
//! ```ron
//! (
//!     log: (
//!         path: "target/mail.log",
//!         format: Mbox,
//!     ),
//! )
//! ```

use std::path::{Path, PathBuf};

use ron::extensions::Extensions;
use serde::Deserialize;

use crate::{
    error::ConfigError,
    format::LogFormat,
    source::LogMailSource,
    transport::LogTransport,
};

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TrackingConfig {
    /// Where the log transport writes, when tests use one
    #[serde(default)]
    pub log: Option<LogConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogConfig {
    pub path: PathBuf,

    #[serde(default)]
    pub format: LogFormat,

    /// Channel written in front of `Monolog` entries
    #[serde(default = "defaults::channel")]
    pub channel: String,
}

mod defaults {
    pub fn channel() -> String {
        String::from("testing")
    }
}

impl TrackingConfig {
    /// Parse a configuration from RON text.
    ///
    /// # Errors
    ///
    /// If the text is not a valid configuration.
    pub fn from_ron(config: &str) -> Result<Self> {
        Ok(ron::Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .from_str(config)?)
    }

    /// Read and parse the configuration at `path`.
    ///
    /// # Errors
    ///
    /// If the file cannot be read or is not a valid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_ron(&config)
    }

    /// The `log` section.
    ///
    /// # Errors
    ///
    /// If the configuration has no `log` section.
    pub fn log(&self) -> Result<&LogConfig> {
        self.log.as_ref().ok_or(ConfigError::MissingField("log"))
    }
}

impl LogConfig {
    /// A transport writing to the configured log
    #[must_use]
    pub fn transport(&self) -> LogTransport {
        LogTransport::new(&self.path, self.format).with_channel(&self.channel)
    }

    /// A source reading the configured log back
    #[must_use]
    pub fn source(&self) -> LogMailSource {
        LogMailSource::new(&self.path, self.format)
    }
}
