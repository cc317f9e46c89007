//! Universal Real-Time Device Control / Master Volume sysex.
//!
//! Wire format: `F0 7F <device> 04 01 <lsb> <msb> F7`. The 14-bit value maps
//! linearly onto a gain of 0.0-1.0.

use crate::message::{SysexMessage, SYSEX_END, SYSEX_START};

/// Universal Real-Time sysex ID.
pub const UNIVERSAL_REAL_TIME: u8 = 0x7F;

/// Device ID meaning "all devices".
pub const ALL_DEVICES: u8 = 0x7F;

/// Sub-ID #1: Device Control.
pub const DEVICE_CONTROL: u8 = 0x04;

/// Sub-ID #2: Master Volume.
pub const MASTER_VOLUME: u8 = 0x01;

/// Largest 14-bit value.
pub const MAX_VALUE: u16 = 0x3FFF;

/// Master volume value carried by the sysex message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MasterVolume {
    value: u16,
}

/// Outcome of matching sysex data against the master volume pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VolumeParse {
    Volume(MasterVolume),
    /// Header matched but the value bytes are missing.
    Truncated,
    NotVolume,
}

impl MasterVolume {
    /// Value is masked to 14 bits.
    pub fn new(value: u16) -> Self {
        Self {
            value: value & MAX_VALUE,
        }
    }

    /// Nearest value for a gain in 0.0-1.0 (clamped).
    pub fn from_gain(gain: f32) -> Self {
        let value = (gain.clamp(0.0, 1.0) * MAX_VALUE as f32).round() as u16;
        Self::new(value)
    }

    /// Match sysex data, i.e. the bytes after the `F0` status byte.
    /// The device ID byte is not checked.
    pub fn parse(data: &[u8]) -> VolumeParse {
        match data {
            [UNIVERSAL_REAL_TIME, _device, DEVICE_CONTROL, MASTER_VOLUME, lsb, msb, ..] => {
                let value = u16::from(lsb & 0x7F) | (u16::from(msb & 0x7F) << 7);
                VolumeParse::Volume(Self { value })
            }
            [UNIVERSAL_REAL_TIME, _device, DEVICE_CONTROL, MASTER_VOLUME, ..] => {
                VolumeParse::Truncated
            }
            // Too short to tell whether the sub-IDs match.
            [UNIVERSAL_REAL_TIME]
            | [UNIVERSAL_REAL_TIME, _]
            | [UNIVERSAL_REAL_TIME, _, DEVICE_CONTROL] => VolumeParse::Truncated,
            _ => VolumeParse::NotVolume,
        }
    }

    /// Match a complete sysex message; continuation packets never match.
    pub fn parse_message(message: &SysexMessage) -> VolumeParse {
        if message.status() != SYSEX_START {
            return VolumeParse::NotVolume;
        }
        Self::parse(message.data())
    }

    #[inline]
    pub fn value(&self) -> u16 {
        self.value
    }

    #[inline]
    pub fn gain(&self) -> f32 {
        self.value as f32 / MAX_VALUE as f32
    }

    /// Encode as a complete message addressed to all devices.
    pub fn to_sysex(&self) -> SysexMessage {
        let lsb = (self.value & 0x7F) as u8;
        let msb = ((self.value >> 7) & 0x7F) as u8;
        SysexMessage::from_data(&[
            UNIVERSAL_REAL_TIME,
            ALL_DEVICES,
            DEVICE_CONTROL,
            MASTER_VOLUME,
            lsb,
            msb,
            SYSEX_END,
        ])
    }
}
