//! Session lifecycle: open the engine and sink, run the render thread, and
//! take everything back on close.

use crate::capability::{Capabilities, DeviceInfo};
use crate::config::{DataSource, Settings};
use crate::engine::{self, SynthEngine};
use crate::lockfree::RunFlag;
use crate::receiver::Receiver;
use crate::render::{RenderLoop, RenderStats, Scratch};
use crate::sink::{AudioFormat, OutputSink, SinkControl};
use crate::{Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use synthbridge_midi::{event_queue, EventConsumer, EventProducer};

const RENDER_THREAD_NAME: &str = "synthbridge-render";

type Worker<E, S> = JoinHandle<Option<RenderLoop<E, S>>>;

struct Session<E, S> {
    running: Arc<RunFlag>,
    worker: Worker<E, S>,
    frames: usize,
}

struct State<E, S> {
    /// Engine and sink while closed. `None` while open, or after a render
    /// thread panic took them down.
    parts: Option<(E, S)>,
    session: Option<Session<E, S>>,
}

/// A MIDI-driven synthesizer streaming PCM to an output sink.
///
/// `open` initializes the engine, opens the sink and starts a dedicated
/// render thread that owns both until `close` joins it again. MIDI goes in
/// through [`Receiver`]s, which any thread may use at any time.
///
/// ```ignore
/// let synth = Synthesizer::builder(engine, MemorySink::new())
///     .data(DataSource::Path("dswebWDM.dat".into()))
///     .build();
/// synth.open()?;
/// synth.receiver().send_short(0x90, 60, 100);
/// synth.close();
/// ```
pub struct Synthesizer<E, S>
where
    E: SynthEngine + 'static,
    S: OutputSink + 'static,
{
    settings: Settings,
    data: DataSource,
    events: EventProducer,
    consumer: EventConsumer,
    control: Arc<SinkControl>,
    stats: Arc<RenderStats>,
    state: Mutex<State<E, S>>,
}

impl<E, S> Synthesizer<E, S>
where
    E: SynthEngine + 'static,
    S: OutputSink + 'static,
{
    pub fn builder(engine: E, sink: S) -> SynthesizerBuilder<E, S> {
        SynthesizerBuilder {
            engine,
            sink,
            settings: Settings::default(),
            data: DataSource::default(),
        }
    }

    /// Start a session. Does nothing if one is already running.
    ///
    /// On failure everything acquired so far is released and the engine
    /// and sink stay with the synthesizer, so `open` can be retried.
    pub fn open(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.session.is_some() {
            return Ok(());
        }

        let (mut engine, mut sink) = state.parts.take().ok_or_else(|| {
            Error::Engine("engine was lost when the render thread panicked".into())
        })?;

        let scratch = match self.prepare(&mut engine, &mut sink) {
            Ok(scratch) => scratch,
            Err(e) => {
                state.parts = Some((engine, sink));
                return Err(e);
            }
        };

        let frames = scratch.frames();
        let running = Arc::new(RunFlag::new(true));
        let render = RenderLoop::new(
            engine,
            sink,
            self.consumer.clone(),
            Arc::clone(&running),
            scratch,
            Arc::clone(&self.stats),
        );

        match spawn_render_thread(render) {
            Ok(worker) => {
                state.session = Some(Session {
                    running,
                    worker,
                    frames,
                });
                tracing::info!(
                    sample_rate = self.control.sample_rate(),
                    frames,
                    "Synthesizer opened"
                );
                Ok(())
            }
            Err((e, render)) => {
                running.stop();
                let (engine, mut sink) = render.into_parts();
                release_sink(&mut sink);
                state.parts = Some((engine, sink));
                Err(Error::ThreadSpawn(e))
            }
        }
    }

    /// Stop the render thread, wait for it and release the sink. Does
    /// nothing if closed.
    ///
    /// Blocks for as long as the render thread needs to finish its current
    /// iteration, including a pending sink write.
    pub fn close(&self) {
        let mut state = self.state.lock();
        let Some(session) = state.session.take() else {
            return;
        };

        session.running.stop();
        match session.worker.join() {
            Ok(Some(render)) => {
                let (engine, mut sink) = render.into_parts();
                release_sink(&mut sink);
                state.parts = Some((engine, sink));
                tracing::info!("Synthesizer closed");
            }
            Ok(None) => tracing::warn!("Render thread exited without its session"),
            Err(_) => tracing::warn!("Render thread panicked, engine and sink dropped"),
        }
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().session.is_some()
    }

    /// A new receiver feeding this synthesizer's event queue.
    pub fn receiver(&self) -> Receiver {
        Receiver::new(self.events.clone(), Arc::clone(&self.control))
    }

    /// Frames per render quantum while open.
    pub fn scratch_frames(&self) -> Option<usize> {
        self.state.lock().session.as_ref().map(|s| s.frames)
    }

    /// Playback position of the current or last session.
    pub fn position_micros(&self) -> u64 {
        self.control.position_micros()
    }

    pub fn gain(&self) -> f32 {
        self.control.gain()
    }

    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities
    }

    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo::new()
    }

    /// Validate, initialize the engine, allocate scratch and bring up the
    /// sink. Leaves the sink closed on failure.
    fn prepare(&self, engine: &mut E, sink: &mut S) -> Result<Scratch> {
        self.settings.validate()?;
        let data = self.data.load()?;
        let initialized = engine::initialize(engine, &self.settings, &data)?;
        let scratch = Scratch::allocate(initialized.quantum)?;

        let format = AudioFormat::pcm16_stereo(initialized.sample_rate);
        if let Err(e) = sink.open(format) {
            sink.close();
            return Err(e);
        }
        if let Err(e) = sink.start() {
            sink.close();
            return Err(e);
        }
        Ok(scratch)
    }
}

impl<E, S> Drop for Synthesizer<E, S>
where
    E: SynthEngine + 'static,
    S: OutputSink + 'static,
{
    fn drop(&mut self) {
        self.close();
    }
}

/// Builder for [`Synthesizer`].
pub struct SynthesizerBuilder<E, S> {
    engine: E,
    sink: S,
    settings: Settings,
    data: DataSource,
}

impl<E, S> SynthesizerBuilder<E, S>
where
    E: SynthEngine + 'static,
    S: OutputSink + 'static,
{
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn data(mut self, data: impl Into<DataSource>) -> Self {
        self.data = data.into();
        self
    }

    /// Settings are validated on `open`, not here.
    pub fn build(self) -> Synthesizer<E, S> {
        let (events, consumer) = event_queue();
        let control = Arc::clone(self.sink.control());
        Synthesizer {
            settings: self.settings,
            data: self.data,
            events,
            consumer,
            control,
            stats: Arc::default(),
            state: Mutex::new(State {
                parts: Some((self.engine, self.sink)),
                session: None,
            }),
        }
    }
}

fn release_sink<S: OutputSink>(sink: &mut S) {
    if let Err(e) = sink.stop() {
        tracing::warn!(error = %e, "Failed to stop output sink");
    }
    sink.close();
}

/// Start the render thread and hand it the loop. If the thread cannot be
/// started the loop comes back with the error.
#[allow(clippy::type_complexity)]
fn spawn_render_thread<E, S>(
    render: RenderLoop<E, S>,
) -> std::result::Result<Worker<E, S>, (std::io::Error, RenderLoop<E, S>)>
where
    E: SynthEngine + 'static,
    S: OutputSink + 'static,
{
    let (handoff, inbox) = crossbeam_channel::bounded::<RenderLoop<E, S>>(1);

    let spawned = thread::Builder::new()
        .name(RENDER_THREAD_NAME.into())
        .spawn(move || inbox.recv().ok().map(RenderLoop::run));

    match spawned {
        Ok(worker) => match handoff.send(render) {
            Ok(()) => Ok(worker),
            Err(crossbeam_channel::SendError(render)) => {
                let _ = worker.join();
                Err((
                    std::io::Error::other("render thread exited before start"),
                    render,
                ))
            }
        },
        Err(e) => Err((e, render)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Effect;
    use crate::sink::{MemorySink, SinkEvent};
    use crate::testing::{ScriptedEngine, StartFails};
    use std::time::{Duration, Instant};

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    fn synth(engine: ScriptedEngine) -> Synthesizer<ScriptedEngine, MemorySink> {
        Synthesizer::builder(engine, MemorySink::new().with_pacing(Duration::from_micros(200)))
            .data(vec![0u8; 32])
            .build()
    }

    #[test]
    fn test_open_initializes_in_order() {
        let engine = ScriptedEngine::new(64);
        let log = engine.log();
        let synth = synth(engine);
        synth.open().unwrap();

        {
            let log = log.lock();
            assert_eq!(
                log.calls,
                vec![
                    "pointer_offset",
                    "validate_settings",
                    "data_file",
                    "synth",
                    "cpu_load",
                    "parameters",
                    "master_volume",
                ]
            );
            assert_eq!(
                log.effects,
                vec![(Effect::Reverb, true), (Effect::Chorus, true)]
            );
            assert_eq!(log.data_len, 32);
        }
        assert_eq!(synth.scratch_frames(), Some(64));
        synth.close();
    }

    #[test]
    fn test_open_close_idempotent() {
        let engine = ScriptedEngine::new(64);
        let log = engine.log();
        let synth = synth(engine);

        synth.close();
        synth.open().unwrap();
        synth.open().unwrap();
        assert!(synth.is_open());
        let synth_inits = log.lock().calls.iter().filter(|&&c| c == "synth").count();
        assert_eq!(synth_inits, 1);

        synth.close();
        synth.close();
        assert!(!synth.is_open());
        assert_eq!(synth.scratch_frames(), None);
    }

    #[test]
    fn test_engine_failure_allows_retry() {
        let engine = ScriptedEngine::new(64).fail_at("synth");
        let sink = MemorySink::new();
        let capture = sink.capture();
        let synth = Synthesizer::builder(engine, sink).data(vec![0u8; 8]).build();

        assert!(matches!(synth.open(), Err(Error::Engine(_))));
        assert!(!synth.is_open());
        assert!(capture.events().is_empty());
        // The engine is still owned by the synthesizer.
        assert!(matches!(synth.open(), Err(Error::Engine(_))));
    }

    #[test]
    fn test_zero_quantum_rejected() {
        let synth = synth(ScriptedEngine::new(0));
        assert!(matches!(synth.open(), Err(Error::EngineInit(_))));
        assert!(!synth.is_open());
    }

    #[test]
    fn test_invalid_settings_rejected_before_engine() {
        let engine = ScriptedEngine::new(64);
        let log = engine.log();
        let synth = Synthesizer::builder(engine, MemorySink::new())
            .settings(Settings {
                polyphony: 0,
                ..Default::default()
            })
            .data(vec![0u8; 8])
            .build();

        assert!(matches!(synth.open(), Err(Error::InvalidConfig(_))));
        assert!(log.lock().calls.is_empty());
    }

    #[test]
    fn test_missing_data_file() {
        let synth = Synthesizer::builder(ScriptedEngine::new(64), MemorySink::new())
            .data(DataSource::Path("/nonexistent/dswebWDM.dat".into()))
            .build();
        assert!(matches!(synth.open(), Err(Error::DataFile { .. })));
    }

    #[test]
    fn test_sink_start_failure_closes_sink() {
        let sink = MemorySink::new();
        let capture = sink.capture();
        let synth = Synthesizer::builder(ScriptedEngine::new(64), StartFails(sink))
            .data(vec![0u8; 8])
            .build();

        assert!(matches!(synth.open(), Err(Error::DeviceUnavailable(_))));
        assert!(!synth.is_open());
        let events = capture.events();
        assert!(matches!(events.first(), Some(SinkEvent::Open(_))));
        assert_eq!(events.last(), Some(&SinkEvent::Close));
    }

    #[test]
    fn test_close_releases_sink_and_reopens() {
        let sink = MemorySink::new().with_pacing(Duration::from_micros(200));
        let capture = sink.capture();
        let synth = Synthesizer::builder(ScriptedEngine::new(32), sink)
            .data(vec![0u8; 8])
            .build();

        synth.open().unwrap();
        assert!(wait_until(|| capture.writes() > 0));
        synth.close();
        let writes = capture.writes();
        thread::sleep(Duration::from_millis(10));
        assert_eq!(capture.writes(), writes, "no writes after close");

        synth.open().unwrap();
        assert!(wait_until(|| capture.writes() > writes));
        synth.close();

        let events = capture.events();
        let closes = events.iter().filter(|e| **e == SinkEvent::Close).count();
        let opens = events
            .iter()
            .filter(|e| matches!(e, SinkEvent::Open(_)))
            .count();
        assert_eq!((opens, closes), (2, 2));
    }

    #[test]
    fn test_each_session_renders_into_fresh_scratch() {
        let engine = ScriptedEngine::new(32);
        let log = engine.log();
        let synth = synth(engine);

        for session in 1..=3 {
            synth.open().unwrap();
            let renders = log.lock().renders;
            assert!(wait_until(|| log.lock().renders > renders + 2));
            synth.close();
            assert_eq!(log.lock().fresh_buffers, session);
        }
    }

    #[test]
    fn test_events_sent_while_closed_render_after_open() {
        let engine = ScriptedEngine::new(32);
        let log = engine.log();
        let synth = synth(engine);

        synth.receiver().send_short(0x90, 60, 100);
        assert!(log.lock().shorts.is_empty());

        synth.open().unwrap();
        assert!(wait_until(|| !log.lock().shorts.is_empty()));
        synth.close();
        assert_eq!(log.lock().shorts, vec![0x0064_3C90]);
    }

    #[test]
    fn test_drop_closes() {
        let sink = MemorySink::new().with_pacing(Duration::from_micros(200));
        let capture = sink.capture();
        let synth = Synthesizer::builder(ScriptedEngine::new(32), sink)
            .data(vec![0u8; 8])
            .build();
        synth.open().unwrap();
        drop(synth);
        assert_eq!(capture.events().last(), Some(&SinkEvent::Close));
    }
}
