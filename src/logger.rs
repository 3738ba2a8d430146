//! Severity-levelled logging for the authentication flow.
//!
//! The flow reports what it decided and why through a [`Logger`] carried by
//! the [`ShopifyConfig`](crate::ShopifyConfig). Messages are rendered as
//!
//! ```text
//! [shopify-app/ERROR] Unexpected error during session validation: ... | {shop: my-store.myshopify.com}
//! ```
//!
//! and handed to a [`LogSink`]. The default sink, [`TracingSink`], turns each
//! message into a `tracing` event at the matching level, so applications keep
//! using their usual subscriber. Integrators that want the messages elsewhere
//! (or tests that want to assert on them) install their own sink.
//!
//! # Example
//!
//! ```rust
//! use shopify_app::logger::{Logger, LogSeverity};
//!
//! let logger = Logger::tracing(LogSeverity::Debug);
//! logger.info("Authenticating admin request", &[("shop", "my-store.myshopify.com")]);
//! ```

use std::fmt;
use std::sync::Arc;

/// Severity of a log message, most severe first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogSeverity {
    /// Something failed and the request could not be served normally.
    Error,
    /// Something looks wrong but the request continues.
    Warning,
    /// High-level decisions (redirecting to OAuth, session found, ...).
    Info,
    /// Step-by-step detail.
    Debug,
}

impl LogSeverity {
    /// Returns the upper-case label used in rendered messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for LogSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Destination for rendered log messages.
pub trait LogSink: Send + Sync {
    /// Receives one rendered message.
    fn log(&self, severity: LogSeverity, message: &str);
}

/// Forwards messages to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, severity: LogSeverity, message: &str) {
        match severity {
            LogSeverity::Error => tracing::error!("{message}"),
            LogSeverity::Warning => tracing::warn!("{message}"),
            LogSeverity::Info => tracing::info!("{message}"),
            LogSeverity::Debug => tracing::debug!("{message}"),
        }
    }
}

/// A levelled logger.
///
/// Messages less severe than the configured level are dropped before they
/// reach the sink.
#[derive(Clone)]
pub struct Logger {
    level: LogSeverity,
    sink: Arc<dyn LogSink>,
}

impl Logger {
    const PREFIX: &'static str = "shopify-app";

    /// Creates a logger that delivers to `sink`.
    #[must_use]
    pub fn new(level: LogSeverity, sink: Arc<dyn LogSink>) -> Self {
        Self { level, sink }
    }

    /// Creates a logger that delivers to [`TracingSink`].
    #[must_use]
    pub fn tracing(level: LogSeverity) -> Self {
        Self::new(level, Arc::new(TracingSink))
    }

    /// Returns the minimum severity that is delivered.
    #[must_use]
    pub const fn level(&self) -> LogSeverity {
        self.level
    }

    /// Renders and delivers a message with optional key/value context.
    pub fn log(&self, severity: LogSeverity, message: &str, context: &[(&str, &str)]) {
        if severity > self.level {
            return;
        }
        self.sink.log(severity, &Self::render(severity, message, context));
    }

    /// Logs at [`LogSeverity::Error`].
    pub fn error(&self, message: &str, context: &[(&str, &str)]) {
        self.log(LogSeverity::Error, message, context);
    }

    /// Logs at [`LogSeverity::Warning`].
    pub fn warning(&self, message: &str, context: &[(&str, &str)]) {
        self.log(LogSeverity::Warning, message, context);
    }

    /// Logs at [`LogSeverity::Info`].
    pub fn info(&self, message: &str, context: &[(&str, &str)]) {
        self.log(LogSeverity::Info, message, context);
    }

    /// Logs at [`LogSeverity::Debug`].
    pub fn debug(&self, message: &str, context: &[(&str, &str)]) {
        self.log(LogSeverity::Debug, message, context);
    }

    fn render(severity: LogSeverity, message: &str, context: &[(&str, &str)]) -> String {
        let mut rendered = format!("[{}/{}] {message}", Self::PREFIX, severity.label());
        if !context.is_empty() {
            let pairs = context
                .iter()
                .map(|(key, value)| format!("{key}: {value}"))
                .collect::<Vec<_>>()
                .join(", ");
            rendered.push_str(&format!(" | {{{pairs}}}"));
        }
        rendered
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::tracing(LogSeverity::Info)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

// Verify Logger is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Logger>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(LogSeverity, String)>>);

    impl LogSink for Recorder {
        fn log(&self, severity: LogSeverity, message: &str) {
            self.0.lock().unwrap().push((severity, message.to_string()));
        }
    }

    #[test]
    fn test_renders_prefix_severity_and_context() {
        let recorder = Arc::new(Recorder::default());
        let logger = Logger::new(LogSeverity::Debug, recorder.clone());

        logger.error("Something broke", &[("shop", "a.myshopify.com"), ("code", "500")]);

        let entries = recorder.0.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, LogSeverity::Error);
        assert_eq!(
            entries[0].1,
            "[shopify-app/ERROR] Something broke | {shop: a.myshopify.com, code: 500}"
        );
    }

    #[test]
    fn test_renders_without_context() {
        let recorder = Arc::new(Recorder::default());
        let logger = Logger::new(LogSeverity::Info, recorder.clone());

        logger.info("Authenticating admin request", &[]);

        let entries = recorder.0.lock().unwrap();
        assert_eq!(entries[0].1, "[shopify-app/INFO] Authenticating admin request");
    }

    #[test]
    fn test_drops_messages_below_level() {
        let recorder = Arc::new(Recorder::default());
        let logger = Logger::new(LogSeverity::Warning, recorder.clone());

        logger.debug("noise", &[]);
        logger.info("noise", &[]);
        logger.warning("kept", &[]);

        let entries = recorder.0.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, LogSeverity::Warning);
    }

    #[test]
    fn test_default_logger_is_info() {
        assert_eq!(Logger::default().level(), LogSeverity::Info);
    }
}
