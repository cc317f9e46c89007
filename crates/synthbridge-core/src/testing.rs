//! Engine and sink doubles for unit tests.

use crate::config::{Parameters, Settings};
use crate::engine::{Effect, SynthEngine};
use crate::sink::{AudioFormat, MemorySink, OutputSink, SinkControl};
use crate::{Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
pub(crate) struct EngineLog {
    pub calls: Vec<&'static str>,
    pub effects: Vec<(Effect, bool)>,
    pub shorts: Vec<u32>,
    pub longs: Vec<Vec<u8>>,
    pub renders: u64,
    /// Render calls handed an all-zero buffer.
    pub fresh_buffers: u64,
    pub data_len: usize,
}

/// Engine that records every call and renders a constant pattern.
pub(crate) struct ScriptedEngine {
    quantum: usize,
    produce_every: u64,
    fail_at: Option<&'static str>,
    log: Arc<Mutex<EngineLog>>,
}

impl ScriptedEngine {
    pub(crate) fn new(quantum: usize) -> Self {
        Self {
            quantum,
            produce_every: 1,
            fail_at: None,
            log: Arc::default(),
        }
    }

    /// Produce frames on every `n`th render call only.
    pub(crate) fn produce_every(mut self, n: u64) -> Self {
        self.produce_every = n;
        self
    }

    pub(crate) fn fail_at(mut self, stage: &'static str) -> Self {
        self.fail_at = Some(stage);
        self
    }

    pub(crate) fn log(&self) -> Arc<Mutex<EngineLog>> {
        Arc::clone(&self.log)
    }

    fn step(&mut self, stage: &'static str) -> Result<()> {
        self.log.lock().calls.push(stage);
        match self.fail_at {
            Some(fail) if fail == stage => Err(Error::Engine(format!("{stage} failed"))),
            _ => Ok(()),
        }
    }
}

impl SynthEngine for ScriptedEngine {
    fn init_pointer_offset(&mut self) -> Result<()> {
        self.step("pointer_offset")
    }

    fn validate_settings(&mut self, _settings: &mut Settings) -> Result<()> {
        self.step("validate_settings")
    }

    fn init_data_file(&mut self, data: &[u8]) -> Result<()> {
        self.log.lock().data_len = data.len();
        self.step("data_file")
    }

    fn init_synth(&mut self, _: u32, _: u32, _: u32) -> Result<()> {
        self.step("synth")
    }

    fn init_effect(&mut self, effect: Effect, enabled: bool) {
        self.log.lock().effects.push((effect, enabled));
    }

    fn init_cpu_load(&mut self, _: u32, _: u32) {
        self.log.lock().calls.push("cpu_load");
    }

    fn init_parameters(&mut self, _: &Parameters) -> Result<()> {
        self.step("parameters")
    }

    fn init_master_volume(&mut self, _: u32) {
        self.log.lock().calls.push("master_volume");
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
        if buffer.iter().all(|&s| s == 0) {
            log.fresh_buffers += 1;
        }
        if self.produce_every == 0 || log.renders % self.produce_every != 0 {
            return false;
        }
        buffer.fill(0x1234);
        true
    }
}

/// Memory sink whose `start` always fails.
pub(crate) struct StartFails(pub MemorySink);

impl OutputSink for StartFails {
    fn open(&mut self, format: AudioFormat) -> Result<()> {
        self.0.open(format)
    }

    fn start(&mut self) -> Result<()> {
        Err(Error::DeviceUnavailable("start refused".into()))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        self.0.write(bytes)
    }

    fn stop(&mut self) -> Result<()> {
        self.0.stop()
    }

    fn close(&mut self) {
        self.0.close()
    }

    fn control(&self) -> &Arc<SinkControl> {
        self.0.control()
    }
}
