//! Integration tests for logging setup

use core_runtime::logging::{init_logging, redact_if_sensitive, LogFormat, LogLevel, LoggingConfig};
use core_runtime::Error;

#[test]
fn test_init_logging_only_once() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);

    init_logging(config.clone()).expect("first initialization succeeds");
    tracing::info!(book_id = 7, "logging initialized");

    // The global subscriber is already set.
    let err = init_logging(config).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_session_values_are_redacted() {
    assert_eq!(redact_if_sensitive("auth_token", "eyJhbGciOi"), "[REDACTED]");

    let email = redact_if_sensitive("email", "librarian@library.org");
    assert!(email.starts_with('l'));
    assert!(!email.contains("library.org"));
}
