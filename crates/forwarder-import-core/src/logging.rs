use log::{info, warn, LevelFilter};
use std::path::Path;

use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::error::{Error, Result};

/// Environment variable that overrides the configured log level
pub const LOG_ENV: &str = "FORWARDER_IMPORT_LOG";

/// Initialize the logger.
///
/// Log lines always go to stderr so stdout stays free. When `log_file` is given, the
/// same lines are also written to a file that rotates at 10MB with 5 archives kept.
pub fn init_logger(level: LevelFilter, log_file: Option<&Path>) -> Result<()> {
    let level = std::env::var(LOG_ENV)
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or(level);

    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S)} {h({l:<5})} {m}{n}")))
        .build();

    let mut builder =
        Config::builder().appender(Appender::builder().build("console", Box::new(console)));
    let mut root = Root::builder().appender("console");

    if let Some(path) = log_file {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        let archived_logs_pattern = format!("{}.{{}}", path.display());
        let file_trigger = SizeTrigger::new(10 * 1024 * 1024);
        let file_roller = FixedWindowRoller::builder()
            .build(&archived_logs_pattern, 5)
            .map_err(|e| Error::Configuration(format!("Failed to create log roller: {}", e)))?;
        let compound_policy = CompoundPolicy::new(Box::new(file_trigger), Box::new(file_roller));

        let rolling_file = RollingFileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(
                "{d(%Y-%m-%d %H:%M:%S)} [{l}] [{M}:{L}] - {m}{n}",
            )))
            .build(path, Box::new(compound_policy))?;

        builder = builder.appender(Appender::builder().build("file", Box::new(rolling_file)));
        root = root.appender("file");
    }

    let config = builder
        .build(root.build(level))
        .map_err(|e| Error::Configuration(format!("Failed to build log config: {}", e)))?;

    log4rs::init_config(config)
        .map_err(|e| Error::Configuration(format!("Failed to initialize log4rs: {}", e)))?;

    if let Some(path) = log_file {
        info!("Logging to file: {}", path.display());
    }
    Ok(())
}

/// Log a media payload that failed to download
pub fn log_download_error(
    message_id: i64,
    attempt: u32,
    attempts: u32,
    error: &dyn std::error::Error,
) {
    warn!(
        "Download failed - Message: {}, Attempt: {}/{}, Error: {}",
        message_id, attempt, attempts, error
    );
}

/// Log a message skipped without producing an entry
pub fn log_media_skip(message_id: i64, reason: &str) {
    info!("Skipping {} {}..", reason, message_id);
}
