//! [`SynthEngine`] implementation over the dynamically loaded core driver.

use crate::error::{DriverError, Result};
use crate::ffi::{Api, D77Parameters, D77Settings, EFFECT_CHORUS, EFFECT_REVERB};
use crate::memory::EngineMemory;
use libloading::Library;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use synthbridge_core::{Effect, Error, Parameters, Settings, SynthEngine};

/// Base name of the driver library; the platform prefix and extension are
/// added by [`default_library_path`].
pub const LIBRARY_NAME: &str = "d77_coredrv";

/// Trailing bytes of the data file that are not part of the image.
const DATA_FOOTER_LEN: usize = 4;

/// `d77_coredrv.dll`, `libd77_coredrv.so` or `libd77_coredrv.dylib`.
pub fn default_library_path() -> PathBuf {
    PathBuf::from(libloading::library_filename(LIBRARY_NAME))
}

/// Bytes of one rendered quantum of stereo i16 samples.
fn render_block_len(frames: usize) -> Option<usize> {
    frames.checked_mul(2 * std::mem::size_of::<i16>())
}

/// The WebSynth D-77 core driver.
pub struct CoreDriver {
    api: Arc<Api>,
    /// The driver keeps pointers into the data image after initialization.
    _image: Option<EngineMemory>,
    /// Allocated on the first render after `init_synth`, sized once.
    render_block: Option<EngineMemory>,
}

impl CoreDriver {
    /// Load the driver from `path` and resolve all of its entry points.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let library = unsafe { Library::new(path) }.map_err(|source| DriverError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        let api = unsafe { Api::resolve(library)? };
        tracing::debug!(path = %path.display(), "Core driver loaded");

        Ok(Self {
            api: Arc::new(api),
            _image: None,
            render_block: None,
        })
    }

    /// Load the driver by its platform file name from the library search
    /// path.
    pub fn load_default() -> Result<Self> {
        Self::load(default_library_path())
    }

    fn render_block(&mut self) -> synthbridge_core::Result<&mut EngineMemory> {
        if self.render_block.is_none() {
            let bytes = render_block_len(self.samples_per_call())
                .ok_or_else(|| Error::Allocation("render block overflow".into()))?;
            self.render_block = Some(EngineMemory::allocate(&self.api, bytes)?);
        }
        self.render_block
            .as_mut()
            .ok_or_else(|| Error::Allocation("render block".into()))
    }
}

impl SynthEngine for CoreDriver {
    fn init_pointer_offset(&mut self) -> synthbridge_core::Result<()> {
        let result = unsafe { (self.api.initialize_pointer_offset)() };
        tracing::trace!(result, "D77_InitializePointerOffset");
        Ok(())
    }

    fn validate_settings(&mut self, settings: &mut Settings) -> synthbridge_core::Result<()> {
        let mut block = EngineMemory::with_value(&self.api, D77Settings::from(&*settings))?;
        unsafe { (self.api.validate_settings)(block.as_mut_ptr().cast()) };
        block.read::<D77Settings>().apply_to(settings);
        Ok(())
    }

    fn init_data_file(&mut self, data: &[u8]) -> synthbridge_core::Result<()> {
        let image_len = data
            .len()
            .checked_sub(DATA_FOOTER_LEN)
            .ok_or(Error::EngineInit("data file is too short"))?;
        let image_len = u32::try_from(image_len)
            .map_err(|_| Error::EngineInit("data file is too large"))?;

        let block = EngineMemory::copy_from(&self.api, data)?;
        if unsafe { (self.api.initialize_data_file)(block.as_ptr(), image_len) } == 0 {
            return Err(Error::EngineInit("D77_InitializeDataFile rejected the data file"));
        }
        self._image = Some(block);
        Ok(())
    }

    fn init_synth(
        &mut self,
        sample_rate: u32,
        polyphony: u32,
        time_resolution: u32,
    ) -> synthbridge_core::Result<()> {
        let ok = unsafe { (self.api.initialize_synth)(sample_rate, polyphony, time_resolution) };
        if ok == 0 {
            return Err(Error::EngineInit("D77_InitializeSynth failed"));
        }
        unsafe { (self.api.initialize_unknown)(0) };
        self.render_block = None;
        Ok(())
    }

    fn init_effect(&mut self, effect: Effect, enabled: bool) {
        let id = match effect {
            Effect::Chorus => EFFECT_CHORUS,
            Effect::Reverb => EFFECT_REVERB,
        };
        unsafe { (self.api.initialize_effect)(id, u32::from(enabled)) };
    }

    fn init_cpu_load(&mut self, low: u32, high: u32) {
        unsafe { (self.api.initialize_cpu_load)(low, high) };
    }

    fn init_parameters(&mut self, parameters: &Parameters) -> synthbridge_core::Result<()> {
        let block = EngineMemory::with_value(&self.api, D77Parameters::from(parameters))?;
        unsafe { (self.api.initialize_parameters)(block.as_ptr().cast()) };
        Ok(())
    }

    fn init_master_volume(&mut self, level: u32) {
        unsafe { (self.api.initialize_master_volume)(level) };
    }

    fn samples_per_call(&self) -> usize {
        unsafe { (self.api.get_rendered_samples_per_call)() as usize }
    }

    fn push_short(&mut self, packed: u32) -> bool {
        unsafe { (self.api.midi_message_short)(packed) != 0 }
    }

    fn push_long(&mut self, message: &[u8]) -> bool {
        let Ok(len) = u32::try_from(message.len()) else {
            return false;
        };
        match EngineMemory::copy_from(&self.api, message) {
            Ok(block) => unsafe { (self.api.midi_message_long)(block.as_ptr(), len) != 0 },
            Err(e) => {
                tracing::debug!(error = %e, "No driver memory for sysex message");
                false
            }
        }
    }

    fn render(&mut self, buffer: &mut [i16]) -> bool {
        let render_samples = self.api.render_samples;
        let block = match self.render_block() {
            Ok(block) => block,
            Err(e) => {
                tracing::debug!(error = %e, "No driver memory for render block");
                return false;
            }
        };
        if unsafe { render_samples(block.as_mut_ptr().cast()) } == 0 {
            return false;
        }

        for (dst, src) in buffer.iter_mut().zip(block.as_slice().chunks_exact(2)) {
            *dst = i16::from_ne_bytes([src[0], src[1]]);
        }
        true
    }
}
