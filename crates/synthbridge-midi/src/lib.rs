//! MIDI types for the synthbridge rendering bridge.
//!
//! - [`ShortMessage`] / [`SysexMessage`]: validated wire messages
//! - [`MidiEvent`]: the two-variant event carried to the render thread
//! - [`MasterVolume`]: Universal Real-Time master volume sysex codec
//! - [`event_queue`]: unbounded multi-producer, single-consumer FIFO

pub mod error;
pub use error::{MessageError, Result};

mod message;
pub use message::{MidiMessage, ShortMessage, SysexMessage, SYSEX_END, SYSEX_START};

mod event;
pub use event::MidiEvent;

pub mod volume;
pub use volume::{MasterVolume, VolumeParse};

mod queue;
pub use queue::{event_queue, EventConsumer, EventProducer};
