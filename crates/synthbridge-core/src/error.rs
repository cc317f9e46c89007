//! Error types for synthbridge-core.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for bridge operations.
///
/// Only [`Synthesizer::open`](crate::Synthesizer::open) surfaces errors from
/// the engine and the output device; once a session runs, render-time
/// failures are logged and absorbed.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Failed to read data file '{}': {source}", path.display())]
    DataFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Allocation failed: {0}")]
    Allocation(String),

    #[error("Engine rejected initialization: {0}")]
    EngineInit(&'static str),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[cfg(feature = "cpal")]
    #[error("Audio device not available")]
    DefaultStreamConfig(#[from] cpal::DefaultStreamConfigError),

    #[cfg(feature = "cpal")]
    #[error("Failed to build audio stream")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[cfg(feature = "cpal")]
    #[error("Failed to play audio stream")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[cfg(feature = "cpal")]
    #[error("Failed to pause audio stream")]
    PauseStream(#[from] cpal::PauseStreamError),

    #[cfg(feature = "cpal")]
    #[error("Failed to enumerate devices")]
    Devices(#[from] cpal::DevicesError),

    #[error("Failed to spawn render thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),

    #[error("Output sink is not open")]
    SinkNotOpen,

    #[error("Not supported: {0}")]
    Unsupported(&'static str),
}

impl Error {
    /// Whether this error belongs to the "device failed to open" family.
    pub fn is_initialization_failure(&self) -> bool {
        !matches!(self, Error::Unsupported(_))
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
