use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error types for the forwarder-import library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid run options or bot mapping config
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// No channel dialog matched the requested name
    #[error("no channel with name \"{0}\" found")]
    ChannelNotFound(String),

    /// No bot record in the config owns the channel
    #[error("no valid BotID found for channel {0}")]
    NoBotFound(i64),

    /// Payload could not be decoded as a raster image
    #[error("Not an image: {0}")]
    NotAnImage(#[from] image::ImageError),

    /// Media payload could not be fetched
    #[error("Download failed: {0}")]
    Download(String),

    /// Manifest could not be written to its destination
    #[error("Failed to write manifest {path}: {source}")]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Session or authentication failure reported by the messaging platform
    #[error("Platform error: {0}")]
    Platform(String),

    /// Run was cancelled before the message stream was exhausted
    #[error("Import interrupted before the history was exhausted")]
    Interrupted,
}

impl Error {
    /// Per-message failures that skip the message instead of aborting the run
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::NotAnImage(_) | Error::Download(_))
    }
}
