//! # Logging & Tracing Infrastructure
//!
//! One global `tracing` subscriber for the whole client. It writes to stdout
//! in the configured [`LogFormat`] and, when the host supplies a
//! [`LoggerSink`], mirrors every event into the host's own log pipeline.
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LoggingConfig};
//! use core_runtime::Environment;
//!
//! init_logging(LoggingConfig::for_environment(Environment::detect()).with_env_filter())?;
//! tracing::info!("Scout client started");
//! ```
//!
//! ## Redaction
//!
//! With `redact_pii` on (the default), fields are classified by name before
//! they reach the sink: secrets (tokens, credentials, callback URIs) become
//! `[REDACTED]`, paths keep only their file name, and e-mail addresses are
//! masked. Stdout output is not rewritten, so never pass a secret as a
//! field value in the first place.

use crate::config::Environment;
use crate::error::{Error, Result};
use bridge_traits::{LogEntry, LogLevel, LoggerSink};

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::{
    filter::EnvFilter,
    fmt::format::FmtSpan,
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    Layer, Registry,
};

/// Environment variable read by [`LoggingConfig::with_env_filter`].
pub const LOG_FILTER_ENV: &str = "SCOUT_LOG";

const REDACTED: &str = "[REDACTED]";

const WORKSPACE_CRATES: &[&str] = &[
    "scout_workspace",
    "core_runtime",
    "core_auth",
    "core_service",
    "provider_orchestrator",
    "bridge_traits",
    "bridge_desktop",
];

// HTTP stack internals are noisy below warn.
const QUIET_DEPENDENCIES: &[&str] = &["h2", "hyper", "hyper_util", "reqwest", "rustls"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, coloured, for a developer terminal.
    Pretty,
    /// One JSON object per line.
    Json,
    /// One plain line per event.
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        }
    }
}

#[derive(Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Level applied to workspace crates when no `filter` is given.
    pub level: LogLevel,
    /// Full `EnvFilter` directive string; replaces the default filter.
    pub filter: Option<String>,
    pub redact_pii: bool,
    pub sink: Option<Arc<dyn LoggerSink>>,
    /// Log span open/close (pretty) or attach span context (json).
    pub span_events: bool,
    pub display_target: bool,
    pub display_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            redact_pii: true,
            sink: None,
            span_events: true,
            display_target: true,
            display_thread_info: false,
        }
    }
}

impl fmt::Debug for LoggingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingConfig")
            .field("format", &self.format)
            .field("level", &self.level)
            .field("filter", &self.filter)
            .field("redact_pii", &self.redact_pii)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl LoggingConfig {
    /// Development logs verbosely to a terminal; production emits JSON at info.
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Development => Self {
                format: LogFormat::Pretty,
                level: LogLevel::Debug,
                ..Self::default()
            },
            Environment::Production => Self {
                format: LogFormat::Json,
                level: LogLevel::Info,
                span_events: false,
                ..Self::default()
            },
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Takes the filter from `SCOUT_LOG` when it is set and non-empty.
    pub fn with_env_filter(self) -> Self {
        self.with_env_filter_from(|name| std::env::var(name).ok())
    }

    pub fn with_env_filter_from<F>(self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(LOG_FILTER_ENV).filter(|value| !value.trim().is_empty()) {
            Some(filter) => self.with_filter(filter),
            None => self,
        }
    }

    pub fn with_pii_redaction(mut self, redact: bool) -> Self {
        self.redact_pii = redact;
        self
    }

    pub fn with_logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    pub fn with_thread_info(mut self, display: bool) -> Self {
        self.display_thread_info = display;
        self
    }

    fn directives(&self) -> String {
        if let Some(filter) = &self.filter {
            return filter.clone();
        }

        let level = self.level.as_str();
        WORKSPACE_CRATES
            .iter()
            .map(|krate| format!("{}={}", krate, level))
            .chain(QUIET_DEPENDENCIES.iter().map(|dep| format!("{}=warn", dep)))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Install the global subscriber. Call once at startup.
///
/// # Errors
///
/// `Error::Config` for an unparsable filter, `Error::Internal` when a global
/// subscriber is already installed.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;

    tracing_subscriber::registry()
        .with(stdout_layer(&config))
        .with(SinkForwarder::new(config.sink.clone(), config.redact_pii))
        .with(filter)
        .try_init()
        .map_err(|e| Error::Internal(format!("Logging already initialized: {}", e)))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    EnvFilter::try_new(config.directives())
        .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))
}

fn stdout_layer(config: &LoggingConfig) -> Box<dyn Layer<Registry> + Send + Sync> {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info);

    match (config.format, config.span_events) {
        (LogFormat::Pretty, true) => layer.pretty().with_span_events(FmtSpan::ACTIVE).boxed(),
        (LogFormat::Pretty, false) => layer.pretty().boxed(),
        (LogFormat::Json, spans) => layer
            .json()
            .flatten_event(true)
            .with_current_span(spans)
            .with_span_list(spans)
            .boxed(),
        (LogFormat::Compact, _) => layer.compact().boxed(),
    }
}

/// Mirrors events into the host [`LoggerSink`].
struct SinkForwarder {
    sink: Option<Arc<dyn LoggerSink>>,
    redact_pii: bool,
}

impl SinkForwarder {
    fn new(sink: Option<Arc<dyn LoggerSink>>, redact_pii: bool) -> Self {
        Self { sink, redact_pii }
    }

    fn to_entry<S>(&self, event: &Event<'_>, ctx: &Context<'_, S>, level: LogLevel) -> LogEntry
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let metadata = event.metadata();
        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let message = fields
            .message
            .take()
            .unwrap_or_else(|| metadata.name().to_string());
        let mut entry = LogEntry::new(level, metadata.target(), message);

        for (name, value) in fields.values {
            let value = if self.redact_pii {
                redact_field(&name, &value)
            } else {
                value
            };
            entry = entry.with_field(name, value);
        }

        match ctx.lookup_current() {
            Some(span) => entry.with_span(span.name()),
            None => entry,
        }
    }
}

impl<S> Layer<S> for SinkForwarder
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let Some(sink) = &self.sink else {
            return;
        };

        let level = sink_level(event.metadata().level());
        if level < sink.min_level() {
            return;
        }

        deliver(Arc::clone(sink), self.to_entry(event, &ctx, level));
    }
}

// Inside a runtime the sink call is spawned so a slow host pipeline never
// blocks the emitting task; outside one it runs to completion in place.
fn deliver(sink: Arc<dyn LoggerSink>, entry: LogEntry) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                if let Err(err) = sink.log(entry).await {
                    eprintln!("Host log sink failed: {}", err);
                }
            });
        }
        Err(_) => {
            if let Err(err) = futures::executor::block_on(sink.log(entry)) {
                eprintln!("Host log sink failed: {}", err);
            }
        }
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    values: HashMap<String, String>,
}

impl FieldCollector {
    fn insert(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            name => {
                self.values.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, format!("{:?}", value));
    }
}

fn sink_level(level: &tracing::Level) -> LogLevel {
    match *level {
        tracing::Level::ERROR => LogLevel::Error,
        tracing::Level::WARN => LogLevel::Warn,
        tracing::Level::INFO => LogLevel::Info,
        tracing::Level::DEBUG => LogLevel::Debug,
        tracing::Level::TRACE => LogLevel::Trace,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Secret,
    Path,
    Plain,
}

fn classify(field_name: &str) -> FieldKind {
    // Substring matches.
    const SECRET_FRAGMENTS: &[&str] = &[
        "token",
        "credential",
        "password",
        "secret",
        "api_key",
        "authorization",
        "bearer",
        "placeholder",
    ];
    // Whole-name matches; `code` as a fragment would catch `status_code`.
    const SECRET_NAMES: &[&str] = &["code", "auth_code", "uri", "callback_uri"];

    let name = field_name.to_ascii_lowercase();
    if SECRET_FRAGMENTS.iter().any(|fragment| name.contains(fragment))
        || SECRET_NAMES.contains(&name.as_str())
    {
        FieldKind::Secret
    } else if name == "path" || name == "file" || name.ends_with("_path") {
        FieldKind::Path
    } else {
        FieldKind::Plain
    }
}

fn redact_field(field_name: &str, value: &str) -> String {
    match classify(field_name) {
        FieldKind::Path => strip_path(value).to_string(),
        _ => redact_if_sensitive(field_name, value),
    }
}

/// Value safe to log under `field_name`: `[REDACTED]` for secret-bearing
/// names, a masked address for anything that looks like an e-mail, the
/// value itself otherwise.
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    if classify(field_name) == FieldKind::Secret {
        return REDACTED.to_string();
    }
    mask_email(value).unwrap_or_else(|| value.to_string())
}

fn mask_email(value: &str) -> Option<String> {
    let (local, domain) = value.split_once('@')?;
    if !domain.contains('.') {
        return None;
    }
    let first: String = local.chars().take(1).collect();
    Some(format!("{}***@{}", first, REDACTED))
}

/// File name portion of a Unix or Windows path.
///
/// ```ignore
/// info!(file = %strip_path("/Users/sam/Scans/invoice.pdf"), "Uploading");
/// // file="invoice.pdf"
/// ```
pub fn strip_path(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as SinkResult;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CapturingSink {
        entries: Mutex<Vec<LogEntry>>,
    }

    #[async_trait]
    impl LoggerSink for CapturingSink {
        async fn log(&self, entry: LogEntry) -> SinkResult<()> {
            self.entries.lock().unwrap().push(entry);
            Ok(())
        }

        fn min_level(&self) -> LogLevel {
            LogLevel::Debug
        }
    }

    fn capture(redact: bool, emit: impl FnOnce()) -> Vec<LogEntry> {
        let sink = Arc::new(CapturingSink::default());
        let layer = SinkForwarder::new(Some(sink.clone() as Arc<dyn LoggerSink>), redact);
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, emit);

        let entries = sink.entries.lock().unwrap();
        entries.clone()
    }

    #[test]
    fn test_environment_presets() {
        let dev = LoggingConfig::for_environment(Environment::Development);
        assert_eq!(dev.format, LogFormat::Pretty);
        assert_eq!(dev.level, LogLevel::Debug);

        let prod = LoggingConfig::for_environment(Environment::Production);
        assert_eq!(prod.format, LogFormat::Json);
        assert_eq!(prod.level, LogLevel::Info);
        assert!(!prod.span_events);
        assert!(prod.redact_pii);
    }

    #[test]
    fn test_env_filter_override() {
        let config = LoggingConfig::default().with_env_filter_from(|name| {
            (name == LOG_FILTER_ENV).then(|| "core_auth=trace".to_string())
        });
        assert_eq!(config.directives(), "core_auth=trace");

        let untouched = LoggingConfig::default().with_env_filter_from(|_| Some("  ".to_string()));
        assert!(untouched.filter.is_none());
    }

    #[test]
    fn test_default_directives() {
        let directives = LoggingConfig::default()
            .with_level(LogLevel::Debug)
            .directives();

        assert!(directives.contains("core_auth=debug"));
        assert!(directives.contains("provider_orchestrator=debug"));
        for krate in ["core_service", "bridge_traits", "bridge_desktop"] {
            assert!(directives.contains(&format!("{}=debug", krate)), "{}", krate);
        }
        assert!(directives.contains("reqwest=warn"));
        assert!(build_filter(&LoggingConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_filter_is_config_error() {
        let config = LoggingConfig::default().with_filter("core_auth=notalevel");
        assert!(matches!(build_filter(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("access_token"), FieldKind::Secret);
        assert_eq!(classify("Authorization"), FieldKind::Secret);
        assert_eq!(classify("code"), FieldKind::Secret);
        assert_eq!(classify("status_code"), FieldKind::Plain);
        assert_eq!(classify("local_path"), FieldKind::Path);
        assert_eq!(classify("file_id"), FieldKind::Plain);
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(
            mask_email("user@example.com").as_deref(),
            Some("u***@[REDACTED]")
        );
        assert_eq!(mask_email("user@localhost"), None);
        assert_eq!(mask_email("F1"), None);
    }

    #[test]
    fn test_forwarder_builds_entry() {
        let entries = capture(false, || {
            let span = tracing::info_span!("process_file");
            let _entered = span.enter();
            tracing::info!(target: "core_service", file_id = "F1", "processing file");
            tracing::trace!("below sink level");
        });

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].target, "core_service");
        assert_eq!(entries[0].message, "processing file");
        assert_eq!(entries[0].field("file_id"), Some("F1"));
        assert_eq!(entries[0].span.as_deref(), Some("process_file"));
    }

    #[test]
    fn test_forwarder_redacts_when_enabled() {
        let entries = capture(true, || {
            tracing::info!(
                token = "ya29.secret",
                file_path = "/Users/sam/invoice.pdf",
                status_code = 401u64,
                "callback"
            );
        });

        assert_eq!(entries[0].field("token"), Some(REDACTED));
        assert_eq!(entries[0].field("file_path"), Some("invoice.pdf"));
        assert_eq!(entries[0].field("status_code"), Some("401"));
    }
}
