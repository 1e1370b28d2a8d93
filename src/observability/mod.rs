//! Logging configuration and event tracing.
//!
//! Structured logging uses the `tracing` crate. [`LoggingConfig::init`]
//! installs a subscriber; [`trace_events`] mirrors a client's pipeline
//! events into the log.

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::client::RestApiClient;
use crate::events::{ListenerId, RestClientEvent, RestClientEventArgs};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// The minimum log level to capture
    pub level: LogLevel,
    /// The output format for log messages
    pub format: LogFormat,
    /// Whether to include timestamps in log output
    pub include_timestamps: bool,
    /// Whether to include the module target in log output
    pub include_target: bool,
}

/// Log level enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Trace-level logging (most verbose)
    Trace,
    /// Debug-level logging
    Debug,
    /// Info-level logging
    Info,
    /// Warning-level logging
    Warn,
    /// Error-level logging (least verbose)
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl From<LogLevel> for tracing::level_filters::LevelFilter {
    fn from(level: LogLevel) -> Self {
        Level::from(level).into()
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors (for development)
    Pretty,
    /// JSON format (for structured logging in production)
    Json,
    /// Compact format (for space-constrained environments)
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            include_timestamps: true,
            include_target: true,
        }
    }
}

impl LoggingConfig {
    /// Creates a new logging configuration with default settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use route_rest_client::observability::{LogFormat, LogLevel, LoggingConfig};
    ///
    /// let config = LoggingConfig::new();
    /// assert_eq!(config.level, LogLevel::Info);
    /// assert_eq!(config.format, LogFormat::Pretty);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration from `REST_CLIENT_LOG_LEVEL` and
    /// `REST_CLIENT_LOG_FORMAT` (`pretty`, `json` or `compact`).
    /// Unrecognized values fall back to the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(level) = std::env::var("REST_CLIENT_LOG_LEVEL")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.level = level;
        }

        if let Ok(format) = std::env::var("REST_CLIENT_LOG_FORMAT") {
            config.format = match format.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "compact" => LogFormat::Compact,
                _ => LogFormat::Pretty,
            };
        }

        config
    }

    /// Sets the log level.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the log format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets whether to include timestamps.
    pub fn with_timestamps(mut self, include: bool) -> Self {
        self.include_timestamps = include;
        self
    }

    /// Initialize logging with this configuration.
    ///
    /// This should be called once at application startup.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use route_rest_client::observability::{LogLevel, LoggingConfig};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// LoggingConfig::new()
    ///     .with_level(LogLevel::Debug)
    ///     .init()?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the logging system has already been initialized.
    pub fn init(self) -> Result<(), Box<dyn std::error::Error>> {
        let filter = EnvFilter::from_default_env()
            .add_directive(tracing::level_filters::LevelFilter::from(self.level).into());
        let registry = tracing_subscriber::registry().with(filter);
        let layer = fmt::layer().with_target(self.include_target);

        match (self.format, self.include_timestamps) {
            (LogFormat::Json, _) => registry.with(layer.json().with_current_span(true)).try_init()?,
            (LogFormat::Compact, true) => registry.with(layer.compact()).try_init()?,
            (LogFormat::Compact, false) => registry.with(layer.compact().without_time()).try_init()?,
            (LogFormat::Pretty, true) => registry.with(layer.with_ansi(true)).try_init()?,
            (LogFormat::Pretty, false) => registry
                .with(layer.with_ansi(true).without_time())
                .try_init()?,
        }

        Ok(())
    }
}

/// Logs one pipeline event.
///
/// Only the method, URL, status and request id are logged. Header values
/// carry tokens and are never written.
pub fn log_event(args: &RestClientEventArgs) {
    let request_id = args
        .request_options
        .additional("requestId")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let route = args.request_options.route_name.as_str();

    match args.kind {
        RestClientEvent::BeforeRequestSend => {
            if let Some(request) = &args.http_request {
                tracing::debug!(
                    event = %args.kind,
                    request_id,
                    route,
                    method = %request.method,
                    url = %request.url,
                    "Outgoing request"
                );
            }
        }
        RestClientEvent::ResponseReceive => {
            tracing::debug!(
                event = %args.kind,
                request_id,
                route,
                status = args.http_response.as_ref().map(|r| r.status),
                "Incoming response"
            );
        }
        RestClientEvent::DataValidationError => {
            tracing::warn!(event = %args.kind, request_id, route, "Request rejected before send");
        }
        RestClientEvent::ConnectionError => {
            tracing::warn!(
                event = %args.kind,
                request_id,
                route,
                url = args.http_request.as_ref().map(|r| r.url.as_str()),
                "Connection failed"
            );
        }
    }
}

/// Registers [`log_event`] for every event kind on `client`.
pub fn trace_events(client: &RestApiClient) -> Vec<ListenerId> {
    [
        RestClientEvent::BeforeRequestSend,
        RestClientEvent::ResponseReceive,
        RestClientEvent::DataValidationError,
        RestClientEvent::ConnectionError,
    ]
    .into_iter()
    .map(|kind| client.add_event_listener(kind, log_event))
    .collect()
}
