//! Normalized events carried from producers to the render thread.

use crate::message::{MidiMessage, ShortMessage, SysexMessage};

/// Event owned by the queue until the render thread consumes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MidiEvent {
    /// Single-word message, forwarded packed.
    Short(ShortMessage),
    /// Variable-length message, forwarded as raw bytes.
    Long(SysexMessage),
}

impl From<MidiMessage> for MidiEvent {
    fn from(message: MidiMessage) -> Self {
        match message {
            MidiMessage::Short(short) => Self::Short(short),
            MidiMessage::Sysex(sysex) => Self::Long(sysex),
        }
    }
}

impl From<ShortMessage> for MidiEvent {
    fn from(message: ShortMessage) -> Self {
        Self::Short(message)
    }
}

impl From<SysexMessage> for MidiEvent {
    fn from(message: SysexMessage) -> Self {
        Self::Long(message)
    }
}
