//! Validated MIDI wire messages.

use crate::error::{MessageError, Result};

/// Start of a system exclusive message.
pub const SYSEX_START: u8 = 0xF0;

/// End of exclusive; also the status of a sysex continuation packet.
pub const SYSEX_END: u8 = 0xF7;

/// Channel voice or system common/real-time message of at most three bytes.
///
/// Data bytes the status does not use are stored as zero, so two messages
/// with the same wire bytes always compare equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShortMessage {
    status: u8,
    data1: u8,
    data2: u8,
}

impl ShortMessage {
    /// Build a message, validating the status byte and every data byte the
    /// status actually uses.
    pub fn new(status: u8, data1: u8, data2: u8) -> Result<Self> {
        let length = Self::wire_length(status)?;
        if length > 1 && data1 > 0x7F {
            return Err(MessageError::DataOutOfRange {
                index: 1,
                value: data1,
            });
        }
        if length > 2 && data2 > 0x7F {
            return Err(MessageError::DataOutOfRange {
                index: 2,
                value: data2,
            });
        }

        Ok(Self {
            status,
            data1: if length > 1 { data1 } else { 0 },
            data2: if length > 2 { data2 } else { 0 },
        })
    }

    /// Parse a message from raw wire bytes. Trailing bytes beyond the
    /// message length are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (&status, data) = bytes.split_first().ok_or(MessageError::Empty)?;
        let length = Self::wire_length(status)?;
        if bytes.len() < length {
            return Err(MessageError::Truncated {
                expected: length,
                actual: bytes.len(),
            });
        }
        let data1 = data.first().copied().unwrap_or(0);
        let data2 = data.get(1).copied().unwrap_or(0);
        Self::new(status, data1, data2)
    }

    #[inline]
    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Result<Self> {
        Self::new(0x90 | (channel & 0x0F), note, velocity)
    }

    #[inline]
    pub fn note_off(channel: u8, note: u8, velocity: u8) -> Result<Self> {
        Self::new(0x80 | (channel & 0x0F), note, velocity)
    }

    #[inline]
    pub fn control_change(channel: u8, control: u8, value: u8) -> Result<Self> {
        Self::new(0xB0 | (channel & 0x0F), control, value)
    }

    #[inline]
    pub fn program_change(channel: u8, program: u8) -> Result<Self> {
        Self::new(0xC0 | (channel & 0x0F), program, 0)
    }

    /// Number of bytes on the wire for a given status, including the status.
    pub fn wire_length(status: u8) -> Result<usize> {
        match status {
            0x80..=0xBF | 0xE0..=0xEF => Ok(3),
            0xC0..=0xDF => Ok(2),
            0xF1 | 0xF3 => Ok(2),
            0xF2 => Ok(3),
            0xF4..=0xF6 | 0xF8..=0xFF => Ok(1),
            // Data bytes, and sysex framing which has no fixed length.
            _ => Err(MessageError::InvalidStatus(status)),
        }
    }

    #[inline]
    pub fn status(&self) -> u8 {
        self.status
    }

    #[inline]
    pub fn data1(&self) -> u8 {
        self.data1
    }

    #[inline]
    pub fn data2(&self) -> u8 {
        self.data2
    }

    /// Channel (0-15) for channel voice messages, `None` for system messages.
    #[inline]
    pub fn channel(&self) -> Option<u8> {
        (self.status < 0xF0).then_some(self.status & 0x0F)
    }

    /// Pack as `status | data1 << 8 | data2 << 16`, the layout synthesis
    /// engines take for single-word messages.
    #[inline]
    pub fn packed(&self) -> u32 {
        u32::from(self.status)
            | (u32::from(self.data1 & 0x7F) << 8)
            | (u32::from(self.data2 & 0x7F) << 16)
    }

    /// Wire bytes, trimmed to the message length.
    pub fn as_bytes(&self) -> ([u8; 3], usize) {
        let length = Self::wire_length(self.status).unwrap_or(1);
        ([self.status, self.data1, self.data2], length)
    }
}

/// System exclusive message, stored with its status byte.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SysexMessage {
    bytes: Box<[u8]>,
}

impl SysexMessage {
    /// Copy `bytes` into a new message. The first byte must be `F0` (a
    /// complete or first packet) or `F7` (a continuation packet).
    pub fn new(bytes: &[u8]) -> Result<Self> {
        match bytes.first() {
            None => Err(MessageError::Empty),
            Some(&SYSEX_START) | Some(&SYSEX_END) => Ok(Self {
                bytes: bytes.into(),
            }),
            Some(&status) => Err(MessageError::NotSysex(status)),
        }
    }

    /// Wrap a payload that excludes the leading `F0`.
    pub fn from_data(data: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(data.len() + 1);
        bytes.push(SYSEX_START);
        bytes.extend_from_slice(data);
        Self {
            bytes: bytes.into_boxed_slice(),
        }
    }

    #[inline]
    pub fn status(&self) -> u8 {
        self.bytes[0]
    }

    /// Payload after the status byte (includes the trailing `F7` if present).
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.bytes[1..]
    }

    /// Full message including the status byte.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A message as submitted by a producer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MidiMessage {
    Short(ShortMessage),
    Sysex(SysexMessage),
}

impl MidiMessage {
    /// Parse raw wire bytes: `F0`/`F7`-led input is sysex, anything else
    /// must be a short message.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        match bytes.first() {
            None => Err(MessageError::Empty),
            Some(&SYSEX_START) | Some(&SYSEX_END) => SysexMessage::new(bytes).map(Self::Sysex),
            Some(_) => ShortMessage::from_bytes(bytes).map(Self::Short),
        }
    }
}

impl From<ShortMessage> for MidiMessage {
    fn from(message: ShortMessage) -> Self {
        Self::Short(message)
    }
}

impl From<SysexMessage> for MidiMessage {
    fn from(message: SysexMessage) -> Self {
        Self::Sysex(message)
    }
}
