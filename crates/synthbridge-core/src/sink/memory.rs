//! In-memory sink for offline capture and tests.

use super::{AudioFormat, OutputSink, SinkControl};
use crate::{Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Bytes retained by default: one second of 44.1 kHz stereo PCM.
const DEFAULT_RETAIN_BYTES: usize = 44100 * 4;

/// Lifecycle calls observed by a [`MemorySink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkEvent {
    Open(AudioFormat),
    Start,
    Stop,
    Close,
}

#[derive(Debug, Default)]
struct CaptureState {
    events: Vec<SinkEvent>,
    writes: u64,
    bytes: u64,
    min_write: Option<usize>,
    max_write: usize,
    data: Vec<u8>,
    retain: usize,
}

/// Handle onto what a [`MemorySink`] has received. Cloneable, so it can be
/// kept after the sink has been moved into a synthesizer.
#[derive(Debug, Clone)]
pub struct Capture {
    state: Arc<Mutex<CaptureState>>,
}

impl Capture {
    pub fn events(&self) -> Vec<SinkEvent> {
        self.state.lock().events.clone()
    }

    pub fn writes(&self) -> u64 {
        self.state.lock().writes
    }

    pub fn bytes(&self) -> u64 {
        self.state.lock().bytes
    }

    /// Smallest and largest write seen, if any.
    pub fn write_sizes(&self) -> Option<(usize, usize)> {
        let state = self.state.lock();
        state.min_write.map(|min| (min, state.max_write))
    }

    /// The first retained bytes of the stream.
    pub fn data(&self) -> Vec<u8> {
        self.state.lock().data.clone()
    }
}

/// Sink that keeps PCM in memory instead of playing it.
///
/// Only the first `retain` bytes are stored; counters cover everything.
/// With pacing set, each write sleeps to imitate a device draining its
/// buffer.
#[derive(Debug)]
pub struct MemorySink {
    control: Arc<SinkControl>,
    capture: Capture,
    format: Option<AudioFormat>,
    pacing: Option<Duration>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::with_retain(DEFAULT_RETAIN_BYTES)
    }

    pub fn with_retain(retain: usize) -> Self {
        let state = CaptureState {
            retain,
            ..Default::default()
        };
        Self {
            control: Arc::new(SinkControl::new()),
            capture: Capture {
                state: Arc::new(Mutex::new(state)),
            },
            format: None,
            pacing: None,
        }
    }

    /// Sleep for `per_write` inside every write.
    pub fn with_pacing(mut self, per_write: Duration) -> Self {
        self.pacing = Some(per_write);
        self
    }

    pub fn capture(&self) -> Capture {
        self.capture.clone()
    }

    fn record(&self, event: SinkEvent) {
        self.capture.state.lock().events.push(event);
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for MemorySink {
    fn open(&mut self, format: AudioFormat) -> Result<()> {
        if !format.is_pcm16_stereo() {
            return Err(Error::InvalidConfig(format!(
                "Unsupported output format: {format:?}"
            )));
        }
        self.control.reset(format.sample_rate);
        self.format = Some(format);
        self.record(SinkEvent::Open(format));
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        if self.format.is_none() {
            return Err(Error::SinkNotOpen);
        }
        self.record(SinkEvent::Start);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        let format = self.format.ok_or(Error::SinkNotOpen)?;
        if let Some(pacing) = self.pacing {
            std::thread::sleep(pacing);
        }

        {
            let mut state = self.capture.state.lock();
            let len = bytes.len();
            state.writes += 1;
            state.bytes += len as u64;
            state.min_write = Some(state.min_write.map_or(len, |min| min.min(len)));
            state.max_write = state.max_write.max(len);
            let keep = state.retain.saturating_sub(state.data.len()).min(len);
            state.data.extend_from_slice(&bytes[..keep]);
        }

        self.control
            .record_frames((bytes.len() / format.frame_bytes()) as u64);
        Ok(bytes.len())
    }

    fn stop(&mut self) -> Result<()> {
        self.record(SinkEvent::Stop);
        Ok(())
    }

    fn close(&mut self) {
        if self.format.take().is_some() {
            self.record(SinkEvent::Close);
        }
    }

    fn control(&self) -> &Arc<SinkControl> {
        &self.control
    }
}
