//! Error types for MIDI message construction.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("Empty MIDI message")]
    Empty,

    #[error("Invalid status byte: {0:#04x}")]
    InvalidStatus(u8),

    #[error("Data byte {index} out of range: {value:#04x}")]
    DataOutOfRange { index: usize, value: u8 },

    #[error("Truncated message: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Not a system exclusive status byte: {0:#04x}")]
    NotSysex(u8),
}

pub type Result<T> = std::result::Result<T, MessageError>;
