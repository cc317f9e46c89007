//! Real-time MIDI-to-PCM rendering bridge.
//!
//! Drives an opaque synthesis engine ([`SynthEngine`]) from a dedicated
//! render thread and streams its output to an [`OutputSink`]. MIDI arrives
//! from any thread through [`Receiver`]s and is queued for the render
//! thread; master volume sysex messages are applied to the sink directly.
//!
//! ```ignore
//! use synthbridge_core::{MemorySink, Synthesizer};
//!
//! let synth = Synthesizer::builder(engine, MemorySink::new())
//!     .data(std::path::PathBuf::from("dswebWDM.dat"))
//!     .build();
//! synth.open()?;
//! synth.receiver().send_short(0x90, 60, 100);
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::{BridgeConfig, DataSource, Parameters, Settings};

pub mod lockfree;

pub mod pcm;

mod engine;
pub use engine::{Effect, SynthEngine};

pub mod sink;
#[cfg(feature = "cpal")]
pub use sink::CpalSink;
pub use sink::{AudioFormat, Capture, MemorySink, OutputSink, SinkControl, SinkEvent};

mod render;
pub use render::RenderStats;

mod receiver;
pub use receiver::Receiver;

pub mod capability;
pub use capability::{Capabilities, DeviceInfo, MAX_POLYPHONY};

mod synthesizer;
pub use synthesizer::{Synthesizer, SynthesizerBuilder};

pub use synthbridge_midi as midi;

#[cfg(test)]
mod testing;
