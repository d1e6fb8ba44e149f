//! Log level handling.
//!
//! The subscriber is installed once by `main`. Everything else changes the
//! level through [`LevelSink`], so resolution can be tested without touching
//! the global subscriber.

use std::cell::Cell;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, Registry};

use crate::error::{Error, Result};

/// Level applied by `Dispatcher::init`, before any flags are read.
pub const DEFAULT_LEVEL: LevelFilter = LevelFilter::WARN;

/// Severity tokens accepted by `--verbose`, most severe first.
pub const VERBOSITY_TOKENS: [&str; 8] = [
    "panic", "fatal", "error", "warn", "warning", "info", "debug", "trace",
];

/// Anything that can receive a new process log level.
pub trait LevelSink {
    fn set_level(&self, level: LevelFilter);
}

/// Parse a severity token into a level filter.
///
/// Matching is case-insensitive. `panic` and `fatal` have no tracing
/// equivalent and collapse to `error`.
pub fn parse_verbosity(token: &str) -> Result<LevelFilter> {
    let level = match token.to_ascii_lowercase().as_str() {
        "panic" | "fatal" | "error" => LevelFilter::ERROR,
        "warn" | "warning" => LevelFilter::WARN,
        "info" => LevelFilter::INFO,
        "debug" => LevelFilter::DEBUG,
        "trace" => LevelFilter::TRACE,
        _ => {
            return Err(Error::InvalidVerbosity {
                token: token.to_string(),
            })
        }
    };
    Ok(level)
}

/// Handle to the installed subscriber's reloadable level filter.
pub struct ReloadHandle(reload::Handle<LevelFilter, Registry>);

impl LevelSink for ReloadHandle {
    fn set_level(&self, level: LevelFilter) {
        if let Err(e) = self.0.reload(level) {
            tracing::warn!(%level, error = %e, "failed to change log level");
        }
    }
}

/// Install the stderr subscriber and return its level handle.
pub fn init() -> anyhow::Result<ReloadHandle> {
    let (filter, handle) = reload::Layer::new(DEFAULT_LEVEL);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()?;
    Ok(ReloadHandle(handle))
}

/// Sink that only remembers the last level it was given.
#[derive(Debug, Default)]
pub struct RecordedLevel(Cell<Option<LevelFilter>>);

impl RecordedLevel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<LevelFilter> {
        self.0.get()
    }
}

impl LevelSink for RecordedLevel {
    fn set_level(&self, level: LevelFilter) {
        self.0.set(Some(level));
    }
}
