use crate::error::{Error, Result};
use log::{debug, LevelFilter};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Default manifest destination
pub const DEFAULT_OUTPUT: &str = "forwarder_import.json";

/// Default Forwarder config used to map channels to bots
pub const DEFAULT_BOT_CONFIG: &str = "forwarder.json";

/// Default session state basename
pub const DEFAULT_STATE: &str = "import";

/// Messages between progress checkpoints
pub const DEFAULT_PROGRESS_INTERVAL: usize = 20;

/// Extra attempts for a failed media download
pub const DEFAULT_DOWNLOAD_RETRIES: u32 = 2;

/// Log level for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Configuration for a single import run
#[derive(Debug, Clone)]
pub struct Config {
    /// Display name of the channel to import from
    pub channel_name: String,

    /// Where to write the import manifest
    pub output: PathBuf,

    /// Forwarder config used to resolve the owning bot
    pub bot_config: PathBuf,

    /// Explicit bot id, 0 means resolve through `bot_config`
    pub bot_id: i64,

    /// Session state basename, `None` keeps the session in memory only
    pub state: Option<String>,

    /// Emit a progress checkpoint every this many messages
    pub progress_interval: usize,

    /// Extra download attempts before a media payload is skipped
    pub download_retries: u32,

    /// Log level
    pub log_level: LogLevel,

    /// Optional log file, rotated by size
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            channel_name: String::new(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            bot_config: PathBuf::from(DEFAULT_BOT_CONFIG),
            bot_id: 0,
            state: Some(DEFAULT_STATE.to_string()),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            download_retries: DEFAULT_DOWNLOAD_RETRIES,
            log_level: LogLevel::Info,
            log_file: None,
        }
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.channel_name.is_empty() {
            return Err(Error::Configuration("\"name\" cannot be empty".to_string()));
        }

        if self.output.as_os_str().is_empty() {
            return Err(Error::Configuration("\"output\" cannot be empty".to_string()));
        }

        if self.progress_interval == 0 {
            return Err(Error::Configuration(
                "Progress interval must be at least 1".to_string(),
            ));
        }

        if matches!(&self.state, Some(state) if state.is_empty()) {
            return Err(Error::Configuration("\"state\" cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Path of the persisted session, if session state is enabled
    pub fn session_file(&self) -> Option<PathBuf> {
        self.state
            .as_ref()
            .map(|state| expand_path(format!("{}.session", state)))
    }
}

/// Expand a leading `~` to the current user's home directory
pub fn expand_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

/// A well-formed bot entry from the Forwarder config
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotRecord {
    /// Channel this bot forwards for
    pub channel_id: i64,

    /// Bot authentication token
    pub telegram_key: String,
}

impl BotRecord {
    fn is_usable(&self) -> bool {
        self.channel_id != 0 && !self.telegram_key.is_empty()
    }
}

/// Channel to bot associations read from the Forwarder config
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BotMapping {
    pub bots: Vec<BotRecord>,
}

impl BotMapping {
    /// Load the bot mapping from a Forwarder config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::Configuration(format!(
                "\"{}\" must be a valid file or a bot ID must be specified",
                path.display()
            )));
        }

        let file = std::fs::File::open(path)
            .map_err(|e| Error::Configuration(format!("Failed to open config file: {}", e)))?;

        let value: Value = serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {}", e)))?;

        Self::from_value(value).map_err(|e| match e {
            Error::Configuration(_) => Error::Configuration(format!(
                "config data in \"{}\" is invalid",
                path.display()
            )),
            other => other,
        })
    }

    /// Build the mapping from parsed config data, dropping malformed bot entries
    pub fn from_value(value: Value) -> Result<Self> {
        let mut root = match value {
            Value::Object(map) if !map.is_empty() => map,
            _ => {
                return Err(Error::Configuration(
                    "config must be a non-empty object".to_string(),
                ))
            }
        };

        let entries = match root.remove("bots") {
            Some(Value::Array(entries)) => entries,
            Some(other) => {
                debug!("Ignoring \"bots\" value that is not a list: {}", other);
                Vec::new()
            }
            None => Vec::new(),
        };

        let bots = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                match serde_json::from_value::<BotRecord>(entry) {
                    Ok(record) if record.is_usable() => Some(record),
                    Ok(_) => {
                        debug!("Skipping bot {}: missing channel_id or telegram_key", index);
                        None
                    }
                    Err(e) => {
                        debug!("Skipping malformed bot {}: {}", index, e);
                        None
                    }
                }
            })
            .collect();

        Ok(Self { bots })
    }

    /// First bot record that owns the given channel
    pub fn find(&self, channel_id: i64) -> Option<&BotRecord> {
        self.bots.iter().find(|bot| bot.channel_id == channel_id)
    }
}
