//! Facade over the opaque synthesis engine.

use crate::config::{Parameters, Settings};
use crate::Result;

/// Engine effect unit identifiers, numbered as the engine expects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Effect {
    Chorus = 0,
    Reverb = 1,
}

/// Typed calls into a synthesis engine that renders interleaved stereo
/// 16-bit frames on demand.
///
/// The bridge calls the `init_*` methods from the thread that opens the
/// session, in declaration order, and then moves the engine to the render
/// thread. From then on only the render thread touches it.
pub trait SynthEngine: Send {
    fn init_pointer_offset(&mut self) -> Result<()>;

    /// Clamp or correct `settings` to what the engine supports.
    fn validate_settings(&mut self, settings: &mut Settings) -> Result<()>;

    /// Hand the engine its data blob. The slice is only valid for the
    /// duration of the call; implementations must copy whatever they keep.
    fn init_data_file(&mut self, data: &[u8]) -> Result<()>;

    fn init_synth(
        &mut self,
        sample_rate: u32,
        polyphony: u32,
        time_resolution: u32,
    ) -> Result<()>;

    fn init_effect(&mut self, effect: Effect, enabled: bool);

    fn init_cpu_load(&mut self, low: u32, high: u32);

    fn init_parameters(&mut self, parameters: &Parameters) -> Result<()>;

    fn init_master_volume(&mut self, level: u32);

    /// Frames produced by one `render` call. Fixed once the synth is
    /// initialized.
    fn samples_per_call(&self) -> usize;

    /// Push `status | data1 << 8 | data2 << 16`. Returns whether the engine
    /// accepted the message.
    fn push_short(&mut self, packed: u32) -> bool;

    /// Push a complete system exclusive message, status byte included.
    fn push_long(&mut self, message: &[u8]) -> bool;

    /// Render one quantum into `buffer` (`2 * samples_per_call()` samples,
    /// interleaved left/right). Returns `false` when no frames were ready.
    fn render(&mut self, buffer: &mut [i16]) -> bool;
}

/// What the session needs to know after the engine is initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Initialized {
    /// Frames per render call.
    pub quantum: usize,
    /// Sample rate after the engine's own validation.
    pub sample_rate: u32,
}

/// Run the engine initialization sequence.
pub(crate) fn initialize<E: SynthEngine + ?Sized>(
    engine: &mut E,
    settings: &Settings,
    data: &[u8],
) -> Result<Initialized> {
    engine.init_pointer_offset()?;

    let mut settings = settings.clone();
    engine.validate_settings(&mut settings)?;

    engine.init_data_file(data)?;
    engine.init_synth(
        settings.sample_rate,
        settings.polyphony,
        settings.time_resolution,
    )?;
    engine.init_effect(Effect::Reverb, settings.reverb);
    engine.init_effect(Effect::Chorus, settings.chorus);
    engine.init_cpu_load(settings.cpu_load_low, settings.cpu_load_high);
    engine.init_parameters(&settings.parameters())?;
    engine.init_master_volume(settings.master_volume);

    match engine.samples_per_call() {
        0 => Err(crate::Error::EngineInit("engine reports zero frames per render")),
        quantum => Ok(Initialized {
            quantum,
            sample_rate: settings.sample_rate,
        }),
    }
}
