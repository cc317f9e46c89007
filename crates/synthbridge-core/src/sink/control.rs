use crate::lockfree::AtomicGain;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// State shared between a sink, the synthesizer and its receivers.
///
/// Everything here is atomic, so producers can change the gain while the
/// render thread is blocked inside `write` and the audio callback reads it.
#[derive(Debug, Default)]
pub struct SinkControl {
    gain: AtomicGain,
    frames: AtomicU64,
    sample_rate: AtomicU32,
}

impl SinkControl {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn gain(&self) -> f32 {
        self.gain.get()
    }

    /// Clamped to `0.0..=1.0`.
    #[inline]
    pub fn set_gain(&self, gain: f32) {
        self.gain.set(gain);
    }

    /// Start a new stream at `sample_rate`; the position restarts at zero.
    /// Gain is kept.
    pub fn reset(&self, sample_rate: u32) {
        self.sample_rate.store(sample_rate, Ordering::Release);
        self.frames.store(0, Ordering::Release);
    }

    /// Count frames that reached the device.
    #[inline]
    pub fn record_frames(&self, frames: u64) {
        self.frames.fetch_add(frames, Ordering::Relaxed);
    }

    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.load(Ordering::Acquire)
    }

    /// Playback position of the current stream. Zero before the first open.
    pub fn position_micros(&self) -> u64 {
        match u64::from(self.sample_rate()) {
            0 => 0,
            rate => self.frames().saturating_mul(1_000_000) / rate,
        }
    }
}
