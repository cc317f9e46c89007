//! Tolerance constants for gain testing.

/// One step of the 14-bit master volume value.
/// Use when comparing a gain derived from a sysex message.
pub const GAIN_EPSILON: f32 = 1.0 / 16383.0;

/// Floating point rounding errors (exact gain values).
pub const FLOAT_EPSILON: f32 = 1e-6;
