//! # synthbridge - real-time MIDI-to-PCM rendering bridge
//!
//! Feeds MIDI from any thread into a synthesis engine running on a
//! dedicated render thread and streams the rendered PCM to an audio device.
//!
//! ## Architecture
//!
//! synthbridge is an umbrella crate over:
//! - **synthbridge-midi** - MIDI messages, master volume sysex, event queue
//! - **synthbridge-core** - Engine facade, render loop, session lifecycle, output sinks
//! - **synthbridge-d77** - WebSynth D-77 core driver, loaded at runtime
//!
//! ## Quick Start
//!
//! ```ignore
//! use synthbridge::prelude::*;
//!
//! let synth = SynthBridge::from_env().build()?;
//! synth.open()?;
//!
//! let receiver = synth.receiver();
//! receiver.send_short(0x90, 60, 100);
//! receiver.send(&MasterVolume::from_gain(0.5).to_sysex().into());
//!
//! synth.close();
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - D-77 driver and CPAL output
//! - `d77` - WebSynth D-77 core driver
//! - `cpal` - Audio device output

/// Re-export of synthbridge-core for direct access
pub use synthbridge_core as core;
pub use synthbridge_midi as midi;

#[cfg(feature = "d77")]
pub use synthbridge_d77 as d77;

pub use synthbridge_core::{
    AudioFormat, BridgeConfig, Capabilities, DataSource, DeviceInfo, Effect, MemorySink,
    OutputSink, Parameters, Receiver, RenderStats, Settings, SinkControl, SynthEngine,
    Synthesizer, SynthesizerBuilder, MAX_POLYPHONY,
};

#[cfg(feature = "cpal")]
pub use synthbridge_core::CpalSink;

pub use synthbridge_midi::{MasterVolume, MidiEvent, MidiMessage, ShortMessage, SysexMessage};

mod error;
pub use error::{Error, Result};

#[cfg(all(feature = "d77", feature = "cpal"))]
mod builder;
#[cfg(all(feature = "d77", feature = "cpal"))]
pub use builder::{SynthBridge, SynthBridgeBuilder, LIBRARY_ENV};

/// Common imports.
pub mod prelude {
    pub use crate::{
        BridgeConfig, DataSource, MasterVolume, MemorySink, MidiMessage, OutputSink, Receiver,
        Settings, ShortMessage, SynthEngine, Synthesizer, SysexMessage,
    };
    pub use crate::{Error, Result};

    #[cfg(all(feature = "d77", feature = "cpal"))]
    pub use crate::SynthBridge;
}
