//! The render thread's loop: forward queued events, render, write.

use crate::engine::SynthEngine;
use crate::lockfree::RunFlag;
use crate::pcm;
use crate::sink::OutputSink;
use crate::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use synthbridge_midi::{EventConsumer, MidiEvent};

/// Counters published by the render thread.
///
/// Cumulative over every session of one synthesizer. Relaxed ordering: the
/// values are for observation, not synchronization.
#[derive(Debug, Default)]
pub struct RenderStats {
    events_forwarded: AtomicU64,
    quanta_written: AtomicU64,
    empty_renders: AtomicU64,
    write_failures: AtomicU64,
}

impl RenderStats {
    /// Events handed to the engine, accepted or not.
    pub fn events_forwarded(&self) -> u64 {
        self.events_forwarded.load(Ordering::Relaxed)
    }

    pub fn quanta_written(&self) -> u64 {
        self.quanta_written.load(Ordering::Relaxed)
    }

    /// Render calls that produced no frames.
    pub fn empty_renders(&self) -> u64 {
        self.empty_renders.load(Ordering::Relaxed)
    }

    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    #[inline]
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Pause after a failed write when the sink has no sample rate yet.
const FAILURE_BACKOFF: Duration = Duration::from_millis(5);

/// Longest pause after a failed write, however large the quantum.
const MAX_FAILURE_BACKOFF: Duration = Duration::from_millis(50);

/// Per-session buffers: one quantum of samples and its encoded bytes.
#[derive(Debug)]
pub(crate) struct Scratch {
    samples: Vec<i16>,
    bytes: Vec<u8>,
}

impl Scratch {
    /// Reserve both buffers for `frames` stereo frames without aborting on
    /// allocation failure.
    pub(crate) fn allocate(frames: usize) -> Result<Self> {
        let samples_len = frames
            .checked_mul(pcm::CHANNELS)
            .ok_or_else(|| Error::Allocation(format!("{frames} frames overflow")))?;
        let bytes_len = samples_len
            .checked_mul(pcm::BYTES_PER_SAMPLE)
            .ok_or_else(|| Error::Allocation(format!("{frames} frames overflow")))?;

        let mut samples = Vec::new();
        samples
            .try_reserve_exact(samples_len)
            .map_err(|e| Error::Allocation(format!("scratch buffer: {e}")))?;
        samples.resize(samples_len, 0);

        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(bytes_len)
            .map_err(|e| Error::Allocation(format!("output buffer: {e}")))?;
        bytes.resize(bytes_len, 0);

        Ok(Self { samples, bytes })
    }

    pub(crate) fn frames(&self) -> usize {
        self.samples.len() / pcm::CHANNELS
    }
}

/// Owns the engine and sink while a session runs.
pub(crate) struct RenderLoop<E, S> {
    engine: E,
    sink: S,
    events: EventConsumer,
    running: Arc<RunFlag>,
    scratch: Scratch,
    stats: Arc<RenderStats>,
    sink_failing: bool,
}

impl<E: SynthEngine, S: OutputSink> RenderLoop<E, S> {
    pub(crate) fn new(
        engine: E,
        sink: S,
        events: EventConsumer,
        running: Arc<RunFlag>,
        scratch: Scratch,
        stats: Arc<RenderStats>,
    ) -> Self {
        Self {
            engine,
            sink,
            events,
            running,
            scratch,
            stats,
            sink_failing: false,
        }
    }

    /// Loop until the run flag is cleared, then hand the loop back so the
    /// controller can recover the engine and sink.
    pub(crate) fn run(mut self) -> Self {
        tracing::debug!(frames = self.scratch.frames(), "Render loop started");
        while self.running.is_running() {
            self.iterate();
        }
        tracing::debug!("Render loop stopped");
        self
    }

    /// One pass: forward pending events, render one quantum, write it.
    pub(crate) fn iterate(&mut self) {
        self.forward_events();

        if self.engine.render(&mut self.scratch.samples) {
            self.write_quantum();
        } else {
            RenderStats::bump(&self.stats.empty_renders);
            std::thread::yield_now();
        }
    }

    fn forward_events(&mut self) {
        for event in self.events.drain() {
            let accepted = match &event {
                MidiEvent::Short(message) => self.engine.push_short(message.packed()),
                MidiEvent::Long(message) => self.engine.push_long(message.as_bytes()),
            };
            if !accepted {
                tracing::trace!(?event, "Engine rejected event");
            }
            RenderStats::bump(&self.stats.events_forwarded);
        }
    }

    fn write_quantum(&mut self) {
        let scratch = &mut self.scratch;
        pcm::encode_le(&scratch.samples, &mut scratch.bytes);

        match self.sink.write(&scratch.bytes) {
            Ok(_) => {
                RenderStats::bump(&self.stats.quanta_written);
                if self.sink_failing {
                    self.sink_failing = false;
                    tracing::debug!("Output sink recovered");
                }
            }
            Err(e) => {
                RenderStats::bump(&self.stats.write_failures);
                if !self.sink_failing {
                    self.sink_failing = true;
                    tracing::warn!(error = %e, "Output sink write failed");
                }
                // A failing sink does not block, so pace the engine to real time.
                std::thread::sleep(self.failure_backoff());
            }
        }
    }

    /// Playback time of one quantum at the sink's rate.
    fn failure_backoff(&self) -> Duration {
        match u64::from(self.sink.control().sample_rate()) {
            0 => FAILURE_BACKOFF,
            rate => {
                let micros = self.scratch.frames() as u64 * 1_000_000 / rate;
                Duration::from_micros(micros).min(MAX_FAILURE_BACKOFF)
            }
        }
    }

    /// Drop the scratch buffers and return the engine and sink.
    pub(crate) fn into_parts(self) -> (E, S) {
        (self.engine, self.sink)
    }
}
