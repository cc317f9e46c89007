//! Static capability answers for the synthesizer device.
//!
//! The engine manages its own instrument set from the data file, so every
//! soundbank and instrument operation is unsupported.

use crate::{Error, Result};

/// Voices the engine can play at once, independent of the configured
/// polyphony.
pub const MAX_POLYPHONY: u32 = 256;

/// Identification strings for the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: &'static str,
    pub vendor: &'static str,
    pub description: &'static str,
    pub version: String,
}

impl DeviceInfo {
    pub fn new() -> Self {
        Self {
            name: "WebSynth D-77",
            vendor: "M-HT / Roman Pauer",
            description: "Software Synthesizer for WebSynth D-77",
            version: format!("Version {}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Patch {
    pub bank: u16,
    pub program: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    pub name: String,
    pub patch: Patch,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Soundbank {
    pub name: String,
    pub instruments: Vec<Instrument>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceStatus {
    pub active: bool,
    pub channel: u8,
    pub bank: u16,
    pub program: u8,
    pub note: u8,
    pub volume: u8,
}

/// The device never sends MIDI, so no transmitter can exist.
#[derive(Debug)]
pub enum Transmitter {}

/// Capability queries. Stateless; every answer is fixed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Capabilities;

impl Capabilities {
    /// `None`: any number of receivers may be created.
    pub fn max_receivers(&self) -> Option<usize> {
        None
    }

    pub fn max_transmitters(&self) -> usize {
        0
    }

    pub fn transmitter(&self) -> Result<Transmitter> {
        Err(Error::Unsupported("transmitters"))
    }

    pub fn transmitters(&self) -> Vec<Transmitter> {
        Vec::new()
    }

    pub fn max_polyphony(&self) -> u32 {
        MAX_POLYPHONY
    }

    /// Not reported by the engine.
    pub fn latency_micros(&self) -> u64 {
        0
    }

    pub fn voice_status(&self) -> Vec<VoiceStatus> {
        Vec::new()
    }

    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo::new()
    }

    pub fn is_soundbank_supported(&self, _soundbank: &Soundbank) -> bool {
        false
    }

    pub fn default_soundbank(&self) -> Option<Soundbank> {
        None
    }

    pub fn available_instruments(&self) -> Vec<Instrument> {
        Vec::new()
    }

    pub fn loaded_instruments(&self) -> Vec<Instrument> {
        Vec::new()
    }

    pub fn load_instrument(&self, _instrument: &Instrument) -> Result<()> {
        Err(Error::Unsupported("instrument loading"))
    }

    pub fn unload_instrument(&self, _instrument: &Instrument) -> Result<()> {
        Err(Error::Unsupported("instrument unloading"))
    }

    pub fn remap_instrument(&self, _from: &Instrument, _to: &Instrument) -> Result<()> {
        Err(Error::Unsupported("instrument remapping"))
    }

    pub fn load_all_instruments(&self, _soundbank: &Soundbank) -> Result<()> {
        Err(Error::Unsupported("soundbank loading"))
    }

    pub fn unload_all_instruments(&self, _soundbank: &Soundbank) -> Result<()> {
        Err(Error::Unsupported("soundbank unloading"))
    }

    pub fn load_instruments(&self, _soundbank: &Soundbank, _patches: &[Patch]) -> Result<()> {
        Err(Error::Unsupported("instrument loading"))
    }

    pub fn unload_instruments(&self, _soundbank: &Soundbank, _patches: &[Patch]) -> Result<()> {
        Err(Error::Unsupported("instrument unloading"))
    }
}
