//! Test helpers and fixtures for synthbridge integration tests
//!
//! Everything runs without audio hardware or the D-77 driver:
//! [`RecordingEngine`] stands in for the engine and records every call,
//! and [`MemorySink`] captures the PCM stream.
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `GAIN_EPSILON` (1/16383): one step of the 14-bit master volume
//! - `FLOAT_EPSILON` (1e-6): exact gain values

#![allow(dead_code)]

pub mod tolerances;

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use synthbridge::core::{Capture, Effect, Parameters};
use synthbridge::prelude::*;

/// Frames per render call used by most tests.
pub const TEST_QUANTUM: usize = 256;

/// Sample value every rendered frame carries.
pub const TEST_SAMPLE: i16 = 0x0102;

/// Sleep per sink write so the render thread does not spin.
pub const TEST_PACING: Duration = Duration::from_micros(100);

/// What the engine was asked to do.
#[derive(Debug, Default)]
pub struct EngineLog {
    pub init_calls: Vec<String>,
    pub shorts: Vec<u32>,
    pub longs: Vec<Vec<u8>>,
    pub renders: u64,
    pub render_threads: Vec<String>,
}

impl EngineLog {
    pub fn pushes(&self) -> usize {
        self.shorts.len() + self.longs.len()
    }
}

/// Engine double that records every call.
pub struct RecordingEngine {
    quantum: usize,
    produce_every: u64,
    fail_data_file: bool,
    log: Arc<Mutex<EngineLog>>,
}

impl RecordingEngine {
    pub fn new(quantum: usize) -> Self {
        Self {
            quantum,
            produce_every: 1,
            fail_data_file: false,
            log: Arc::default(),
        }
    }

    /// Produce frames only on every `n`th render call.
    pub fn produce_every(mut self, n: u64) -> Self {
        self.produce_every = n;
        self
    }

    pub fn failing_data_file(mut self) -> Self {
        self.fail_data_file = true;
        self
    }

    pub fn log(&self) -> Arc<Mutex<EngineLog>> {
        Arc::clone(&self.log)
    }

    fn record(&self, call: impl Into<String>) {
        self.log.lock().init_calls.push(call.into());
    }
}

impl SynthEngine for RecordingEngine {
    fn init_pointer_offset(&mut self) -> synthbridge::core::Result<()> {
        self.record("init_pointer_offset");
        Ok(())
    }

    fn validate_settings(&mut self, _settings: &mut Settings) -> synthbridge::core::Result<()> {
        self.record("validate_settings");
        Ok(())
    }

    fn init_data_file(&mut self, data: &[u8]) -> synthbridge::core::Result<()> {
        self.record(format!("init_data_file({})", data.len()));
        if self.fail_data_file {
            return Err(synthbridge::core::Error::EngineInit("bad data file"));
        }
        Ok(())
    }

    fn init_synth(
        &mut self,
        sample_rate: u32,
        polyphony: u32,
        time_resolution: u32,
    ) -> synthbridge::core::Result<()> {
        self.record(format!(
            "init_synth({sample_rate}, {polyphony}, {time_resolution})"
        ));
        Ok(())
    }

    fn init_effect(&mut self, effect: Effect, enabled: bool) {
        self.record(format!("init_effect({effect:?}, {enabled})"));
    }

    fn init_cpu_load(&mut self, low: u32, high: u32) {
        self.record(format!("init_cpu_load({low}, {high})"));
    }

    fn init_parameters(&mut self, parameters: &Parameters) -> synthbridge::core::Result<()> {
        self.record(format!("init_parameters({})", parameters.output_level));
        Ok(())
    }

    fn init_master_volume(&mut self, level: u32) {
        self.record(format!("init_master_volume({level})"));
    }

    fn samples_per_call(&self) -> usize {
        self.quantum
    }

    fn push_short(&mut self, packed: u32) -> bool {
        self.log.lock().shorts.push(packed);
        true
    }

    fn push_long(&mut self, message: &[u8]) -> bool {
        self.log.lock().longs.push(message.to_vec());
        true
    }

    fn render(&mut self, buffer: &mut [i16]) -> bool {
        let mut log = self.log.lock();
        log.renders += 1;
        if log.render_threads.is_empty() {
            let name = std::thread::current().name().unwrap_or("").to_string();
            log.render_threads.push(name);
        }
        if self.produce_every == 0 || log.renders % self.produce_every != 0 {
            return false;
        }
        buffer.fill(TEST_SAMPLE);
        true
    }
}

/// A synthesizer over a recording engine and a paced memory sink.
pub struct TestRig {
    pub synth: Synthesizer<RecordingEngine, MemorySink>,
    pub log: Arc<Mutex<EngineLog>>,
    pub capture: Capture,
}

pub fn test_rig(quantum: usize) -> TestRig {
    test_rig_with(RecordingEngine::new(quantum))
}

pub fn test_rig_with(engine: RecordingEngine) -> TestRig {
    init_tracing();
    let log = engine.log();
    let sink = MemorySink::new().with_pacing(TEST_PACING);
    let capture = sink.capture();
    let synth = Synthesizer::builder(engine, sink)
        .data(test_data())
        .build();
    TestRig {
        synth,
        log,
        capture,
    }
}

/// In-memory data image with the 4-byte footer.
pub fn test_data() -> Vec<u8> {
    vec![0u8; 64]
}

/// Poll `condition` every millisecond for up to `max_wait_ms`.
pub fn wait_until(max_wait_ms: u64, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    let timeout = Duration::from_millis(max_wait_ms);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    false
}

/// Route `tracing` output through the test harness. Safe to call from
/// every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Packed form of a short message as the engine receives it.
pub fn packed(status: u8, data1: u8, data2: u8) -> u32 {
    u32::from(status) | (u32::from(data1) << 8) | (u32::from(data2) << 16)
}

/// Decode captured little-endian PCM.
pub fn samples(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect()
}
