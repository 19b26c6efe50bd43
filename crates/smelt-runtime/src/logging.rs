//! Logging setup for Smelt.
//!
//! Everything in Smelt logs through `tracing`. This module turns a
//! [`LoggingConfig`] into a `tracing-subscriber` pipeline: one `fmt` layer
//! for the configured format, writing to stdout, stderr or a file through
//! `tracing-appender`, filtered by an [`EnvFilter`].
//!
//! Each resolution runs inside a `service_config` span carrying the service
//! id, so enabling `span_events.close` logs one timing line per resolution.
//!
//! ```rust,ignore
//! use smelt_runtime::{LoggingBuilder, SmeltConfig};
//!
//! let config = SmeltConfig::default();
//! LoggingBuilder::from_config(&config.logging)
//!     .directive("smelt_framework=trace")
//!     .try_init()?;
//! ```

use std::ffi::OsStr;
use std::path::Path;

use tracing::Subscriber;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::{LogFormat, LogOutput, LoggingConfig, SpanEventConfig};

/// File name used when the configured log path has none.
const DEFAULT_LOG_FILE: &str = "smelt.log";

/// Initializes logging from a [`LoggingConfig`].
///
/// Does nothing if a global subscriber is already installed.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = LoggingBuilder::from_config(config).try_init();
}

/// Installs the global subscriber described by a [`LoggingConfig`], plus any
/// extra filter directives.
pub struct LoggingBuilder {
    config: LoggingConfig,
    directives: Vec<String>,
}

impl LoggingBuilder {
    /// Starts from `config`.
    pub fn from_config(config: &LoggingConfig) -> Self {
        Self {
            config: config.clone(),
            directives: Vec::new(),
        }
    }

    /// Adds a filter directive such as `smelt_framework=trace`, applied after
    /// the configured per-target filters.
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Installs the subscriber, failing if one is already set.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let layer = self.fmt_layer(self.writer());
        tracing_subscriber::registry()
            .with(layer)
            .with(self.filter())
            .try_init()
    }

    /// Per-target overrides followed by the extra directives.
    fn directives(&self) -> Vec<String> {
        self.config
            .filters
            .iter()
            .map(|(target, level)| format!("{target}={level}"))
            .chain(self.directives.iter().cloned())
            .collect()
    }

    /// `RUST_LOG` replaces the configured base level; directives apply on top.
    fn filter(&self) -> EnvFilter {
        let base = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.config.level.as_str()));

        self.directives()
            .into_iter()
            .fold(base, |filter, directive| match directive.parse() {
                Ok(d) => filter.add_directive(d),
                Err(e) => {
                    eprintln!("Ignoring invalid log directive {directive:?}: {e}");
                    filter
                }
            })
    }

    fn writer(&self) -> BoxMakeWriter {
        match self.config.output {
            LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
            LogOutput::File => match &self.config.file_path {
                Some(path) => {
                    let dir = path
                        .parent()
                        .filter(|dir| !dir.as_os_str().is_empty())
                        .unwrap_or_else(|| Path::new("."));
                    let name = path
                        .file_name()
                        .unwrap_or_else(|| OsStr::new(DEFAULT_LOG_FILE));
                    BoxMakeWriter::new(tracing_appender::rolling::never(dir, name))
                }
                None => {
                    eprintln!("Log output is `file` but no `file_path` is set, using stdout");
                    BoxMakeWriter::new(std::io::stdout)
                }
            },
        }
    }

    fn fmt_layer<S>(&self, writer: BoxMakeWriter) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let layer = fmt::layer()
            .with_writer(writer)
            .with_span_events(span_events(&self.config.span_events))
            .with_thread_ids(self.config.thread_ids)
            .with_file(self.config.file_location)
            .with_line_number(self.config.file_location);

        match self.config.format {
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Full => layer.boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            #[cfg(feature = "json-log")]
            LogFormat::Json => layer.json().boxed(),
            #[cfg(not(feature = "json-log"))]
            LogFormat::Json => {
                eprintln!("JSON logging requires the `json-log` feature, using compact");
                layer.compact().boxed()
            }
        }
    }
}

/// Maps the configured span events onto `fmt` span flags.
fn span_events(config: &SpanEventConfig) -> FmtSpan {
    [
        (config.new, FmtSpan::NEW),
        (config.enter, FmtSpan::ENTER),
        (config.exit, FmtSpan::EXIT),
        (config.close, FmtSpan::CLOSE),
    ]
    .into_iter()
    .filter(|(enabled, _)| *enabled)
    .fold(FmtSpan::NONE, |acc, (_, flag)| acc | flag)
}
