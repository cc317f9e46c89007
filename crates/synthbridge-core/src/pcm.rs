//! Interleaved 16-bit PCM framing.

/// Output is always stereo.
pub const CHANNELS: usize = 2;

pub const BYTES_PER_SAMPLE: usize = 2;

/// Bytes needed for `frames` stereo frames.
#[inline]
pub const fn frame_bytes(frames: usize) -> usize {
    frames * CHANNELS * BYTES_PER_SAMPLE
}

/// Encode samples as little-endian bytes. `out` must hold
/// `samples.len() * 2` bytes; extra room is left untouched.
#[inline]
pub fn encode_le(samples: &[i16], out: &mut [u8]) {
    for (dst, sample) in out.chunks_exact_mut(BYTES_PER_SAMPLE).zip(samples) {
        dst.copy_from_slice(&sample.to_le_bytes());
    }
}

/// Decode little-endian bytes into samples. A trailing odd byte is ignored.
#[inline]
pub fn decode_le(bytes: &[u8]) -> impl Iterator<Item = i16> + '_ {
    bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
}
