use std::str::FromStr;

use tracing::metadata::LevelFilter;
use tracing_subscriber::{
    Layer, filter::FilterFn, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

/// Emit an event at `$level` inside a span named `$span`, so every line in
/// the test output is tagged with the part of the capture pipeline it came
/// from.
#[macro_export]
macro_rules! log {
    ($level:expr, $span:expr, $($msg:expr),*) => {{
        let span = $crate::tracing::span!($level, $span);
        let _enter = span.enter();

        $crate::tracing::event!($level, $($msg),*)
    }};
}

/// `capture` span: the outbox being attached to a mailer, each message the
/// listener copies into it, and sends ignored after the outbox was dropped.
/// Defaults to `TRACE`.
#[macro_export]
macro_rules! capture {
    (level = $level:ident, $($msg:expr),*) => {
        $crate::log!($crate::tracing::Level::$level, "capture", $($msg),*)
    };

    ($($msg:expr),*) => {
        $crate::capture!(level = TRACE, $($msg),*)
    };
}

/// `transport` span: plugin registration and pruning on the mailer, messages
/// discarded by the null transport or appended to a log file, and transport
/// failures. Defaults to `TRACE`.
#[macro_export]
macro_rules! transport {
    (level = $level:ident, $($msg:expr),*) => {
        $crate::log!($crate::tracing::Level::$level, "transport", $($msg),*)
    };

    ($($msg:expr),*) => {
        $crate::transport!(level = TRACE, $($msg),*)
    };
}

/// `source` span: log files read back by a log mail source, including how
/// many messages were parsed and log files that do not exist yet. Defaults
/// to `TRACE`.
#[macro_export]
macro_rules! source {
    (level = $level:ident, $($msg:expr),*) => {
        $crate::log!($crate::tracing::Level::$level, "source", $($msg),*)
    };

    ($($msg:expr),*) => {
        $crate::source!(level = TRACE, $($msg),*)
    };
}

fn level() -> LevelFilter {
    let default = if cfg!(debug_assertions) {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    };

    std::env::var("LOG_LEVEL").map_or(default, |level| {
        LevelFilter::from_str(level.as_str()).unwrap_or_else(|_| {
            eprintln!("Invalid log level specified {level}, defaulting to {default}");
            default
        })
    })
}

/// Install the global subscriber.
///
/// Test binaries usually call this from several tests, so a subscriber that
/// is already installed is left alone.
pub fn init() {
    let _ = tracing_subscriber::Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_ansi(true)
                .with_test_writer()
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_filter(level())
                .with_filter(FilterFn::new(|metadata| {
                    metadata.target().starts_with("mailtrack")
                })),
        )
        .try_init();
}
