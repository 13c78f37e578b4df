//! Global subscriber and redaction behaviour seen from outside the crate.

use async_trait::async_trait;
use bridge_traits::{error::Result as SinkResult, LogEntry, LogLevel, LoggerSink};
use core_runtime::logging::{
    init_logging, redact_if_sensitive, strip_path, LogFormat, LoggingConfig,
};
use core_runtime::{Environment, Error};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingSink {
    entries: Mutex<Vec<LogEntry>>,
}

#[async_trait]
impl LoggerSink for RecordingSink {
    async fn log(&self, entry: LogEntry) -> SinkResult<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

// A global subscriber can only be installed once per process, so the whole
// lifecycle lives in one test.
#[test]
fn test_global_init_forwards_to_sink_and_rejects_second_init() {
    let sink = Arc::new(RecordingSink::default());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_filter("logging_integration=debug")
        .with_logger_sink(sink.clone());

    init_logging(config).unwrap();

    tracing::info!(credential = "ya29.secret", file_id = "F1", "signed in");
    tracing::trace!("below sink level");

    {
        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "signed in");
        assert_eq!(
            entries[0].fields.get("credential"),
            Some(&"[REDACTED]".to_string())
        );
        assert_eq!(entries[0].fields.get("file_id"), Some(&"F1".to_string()));
    }

    let second = init_logging(LoggingConfig::default());
    assert!(matches!(second, Err(Error::Internal(_))));
}

#[test]
fn test_secret_bearing_fields_are_redacted() {
    for field in [
        "token",
        "access_token",
        "credential",
        "session_placeholder",
        "authorization",
        "callback_uri",
    ] {
        assert_eq!(redact_if_sensitive(field, "value"), "[REDACTED]", "{}", field);
    }
}

#[test]
fn test_operational_fields_pass_through() {
    assert_eq!(redact_if_sensitive("file_id", "F1"), "F1");
    assert_eq!(redact_if_sensitive("status", "moved"), "moved");
    assert_eq!(redact_if_sensitive("status_code", "500"), "500");
    assert_eq!(redact_if_sensitive("target_folder", "Invoices"), "Invoices");
}

#[test]
fn test_addresses_are_masked_under_any_field() {
    let masked = redact_if_sensitive("owner", "sam@example.com");
    assert_eq!(masked, "s***@[REDACTED]");
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/home/user/scans/receipt.pdf"), "receipt.pdf");
    assert_eq!(strip_path("C:\\Users\\Sam\\Scans\\receipt.pdf"), "receipt.pdf");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_production_preset_with_overrides() {
    let config = LoggingConfig::for_environment(Environment::Production)
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_pii_redaction(false)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(!config.redact_pii);
    assert!(!config.span_events);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}
