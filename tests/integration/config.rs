//! Configuration drives the host scheduler

use std::io::Write;

use tickbridge::util::config::Config;
use tickbridge::util::logger::{self, LogLevel};
use tickbridge::TickScheduler;

#[test]
fn test_config_file_configures_scheduler() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "(scheduler: (async_workers: 3, thread_name: \"cfg-pool\"), logging: (level: Warn))"
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.logging.level, LogLevel::Warn);

    let scheduler = TickScheduler::with_config(config.scheduler).unwrap();
    assert_eq!(scheduler.num_workers(), 3);
}

#[test]
fn test_logger_can_be_installed_once() {
    let config = Config::from_ron_str("(logging: (level: Debug))").unwrap();

    // Either this call installs it or an earlier one already did.
    config.init_logger();
    assert!(!config.init_logger());
    assert!(!logger::try_init_with_level(LogLevel::Trace));
    tracing::debug!("logger installed");
}
