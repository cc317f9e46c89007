//! Audio output sinks.
//!
//! A sink consumes interleaved stereo 16-bit PCM from the render thread.
//! `write` blocks until the sink has accepted the bytes, which is the only
//! backpressure the render loop sees.

mod control;
pub use control::SinkControl;

mod memory;
pub use memory::{Capture, MemorySink, SinkEvent};

#[cfg(feature = "cpal")]
mod device;
#[cfg(feature = "cpal")]
pub use device::CpalSink;

use crate::Result;
use std::sync::Arc;

/// PCM layout negotiated when a sink is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub signed: bool,
    pub big_endian: bool,
}

impl AudioFormat {
    /// Interleaved stereo, signed 16-bit little-endian.
    pub const fn pcm16_stereo(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 2,
            bits_per_sample: 16,
            signed: true,
            big_endian: false,
        }
    }

    #[inline]
    pub fn frame_bytes(&self) -> usize {
        usize::from(self.channels) * usize::from(self.bits_per_sample / 8)
    }

    pub(crate) fn is_pcm16_stereo(&self) -> bool {
        *self == Self::pcm16_stereo(self.sample_rate)
    }
}

/// Destination for rendered audio.
///
/// The sink is moved onto the render thread for the duration of a session,
/// so `write` is only ever called from that thread. Gain and position go
/// through the shared [`SinkControl`] instead, which any thread may touch
/// at any time, including while a `write` is blocked.
pub trait OutputSink: Send {
    /// Prepare the device for `format`. Implementations reset the position
    /// in [`SinkControl`] here.
    fn open(&mut self, format: AudioFormat) -> Result<()>;

    fn start(&mut self) -> Result<()>;

    /// Queue `bytes` for playback, blocking until they are accepted.
    /// Returns the number of bytes taken.
    fn write(&mut self, bytes: &[u8]) -> Result<usize>;

    fn stop(&mut self) -> Result<()>;

    /// Release the device. Safe to call on a sink that was never opened.
    fn close(&mut self);

    fn control(&self) -> &Arc<SinkControl>;

    /// Linear gain in `0.0..=1.0`.
    fn set_gain(&self, gain: f32) {
        self.control().set_gain(gain);
    }

    fn position_micros(&self) -> u64 {
        self.control().position_micros()
    }
}
