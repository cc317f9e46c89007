//! Lock-free primitives shared between producer, control and render threads.

use atomic_float::AtomicF32;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag for the render thread.
///
/// Stores use `Release` and loads use `Acquire`, so a `stop()` issued by the
/// controlling thread is reliably observed at the top of the next render
/// iteration.
#[derive(Debug, Default)]
#[repr(align(64))]
pub struct RunFlag {
    value: AtomicBool,
}

impl RunFlag {
    pub fn new(running: bool) -> Self {
        Self {
            value: AtomicBool::new(running),
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn start(&self) {
        self.value.store(true, Ordering::Release);
    }

    /// Returns whether the flag was set.
    #[inline]
    pub fn stop(&self) -> bool {
        self.value.swap(false, Ordering::AcqRel)
    }
}

/// Linear gain in `0.0..=1.0`, readable from the audio callback without locks.
#[derive(Debug)]
#[repr(align(64))]
pub struct AtomicGain {
    value: AtomicF32,
}

impl AtomicGain {
    pub fn new(gain: f32) -> Self {
        Self {
            value: AtomicF32::new(clamp_gain(gain)),
        }
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.value.load(Ordering::Acquire)
    }

    /// Out-of-range and NaN values are clamped.
    #[inline]
    pub fn set(&self, gain: f32) {
        self.value.store(clamp_gain(gain), Ordering::Release);
    }
}

impl Default for AtomicGain {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[inline]
fn clamp_gain(gain: f32) -> f32 {
    if gain.is_nan() {
        0.0
    } else {
        gain.clamp(0.0, 1.0)
    }
}
