//! Integration tests for error types

use spyglass_foundation::{Error, ErrorContext, ErrorKind, InstanceId, ResourceLimit};

#[test]
fn error_displays_kind() {
    let err = Error::unit_not_found("Widget");
    assert_eq!(err.to_string(), "unit not found: Widget");
    assert!(matches!(err.kind, ErrorKind::UnitNotFound(ref n) if n == "Widget"));
}

#[test]
fn io_error_includes_operation() {
    let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err = Error::io("writing chunk", &source);
    assert!(err.to_string().contains("writing chunk: denied"));
}

#[test]
fn context_is_attached() {
    let err = Error::stale_instance(InstanceId::new(1, 2))
        .with_context(ErrorContext::new().with_source("heap"));
    assert!(err.context.is_some());
    assert!(matches!(err.kind, ErrorKind::StaleInstance(_)));
}

#[test]
fn invalid_setting_message() {
    let err = Error::invalid_setting("max-nesting-level", "deep");
    assert_eq!(err.to_string(), "invalid setting max-nesting-level: \"deep\"");
}

#[test]
fn resource_limit_display() {
    assert_eq!(
        ResourceLimit::Time { limit_secs: 60 }.to_string(),
        "max runtime (60s) exceeded"
    );
    assert!(ResourceLimit::Calls { limit: 3 }.to_string().contains('3'));
}
