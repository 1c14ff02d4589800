// SPDX-License-Identifier: MIT OR Apache-2.0
use contextlog::context::Context;
use contextlog::{
    InMemoryHandler, LoggingConfig, Patch, add_global_handler, fields, registry, thread,
};
use std::sync::Arc;

#[test]
fn test_apply_configuration() {
    let config = LoggingConfig::from_json(
        r#"{
            "level": "info",
            "formatters": [
                { "stage": "partial", "format": "{levelname} [{request_id}] {message} {_extra}" },
                { "stage": "error_chain" }
            ],
            "patch_threading": true
        }"#,
    )
    .unwrap();

    assert_eq!(config.apply().unwrap(), Patch::Applied);
    assert!(std::ptr::eq(registry::logger_class(), &registry::CONTEXTUAL));
    assert!(std::ptr::eq(thread::start_hook(), &thread::CARRIER_START));
    assert_eq!(log::max_level(), log::LevelFilter::Info);

    // applying again keeps the installed registry
    assert_eq!(config.apply().unwrap(), Patch::AlreadyApplied);

    let handler = Arc::new(InMemoryHandler::with_pipeline(config.pipeline()));
    add_global_handler(handler.clone());
    {
        let _scope = Context::bind(fields! { request_id = "r-1", user = "ann" });
        log::warn!("disk almost full");
        log::debug!("not at this level");
    }
    log::warn!("outside");

    assert_eq!(
        handler.drain_logs(),
        "WARNING [r-1] disk almost full user=\"ann\"\nWARNING [] outside"
    );
}
