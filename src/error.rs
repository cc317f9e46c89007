//! Centralized error type for the synthbridge umbrella crate.
//!
//! Wraps the subsystem errors so `?` propagates across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] synthbridge_core::Error),

    #[error("MIDI: {0}")]
    Midi(#[from] synthbridge_midi::MessageError),

    #[cfg(feature = "d77")]
    #[error("Driver: {0}")]
    Driver(#[from] synthbridge_d77::DriverError),
}

pub type Result<T> = std::result::Result<T, Error>;
