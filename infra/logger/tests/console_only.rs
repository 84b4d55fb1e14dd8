use fkit_logger::{LevelFilter, Logger};

#[test]
fn init_console_only_writes_no_files() {
    let logger = Logger::builder()
        .name("fkit-console-only")
        .level(LevelFilter::DEBUG)
        .directive("fkit_registry=trace")
        .init()
        .expect("logger should initialize");

    assert_eq!(logger.name(), "fkit-console-only");
    assert!(!logger.writes_files());
}
