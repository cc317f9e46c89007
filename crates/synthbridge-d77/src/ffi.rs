//! Raw bindings to the `d77_coredrv` library.
//!
//! Every pointer handed to the driver must come from `D77_AllocateMemory`;
//! the driver relocates pointers against its own base after
//! `D77_InitializePointerOffset`.

use crate::error::{DriverError, Result};
use libloading::Library;
use std::ffi::c_void;
use synthbridge_core::{Parameters, Settings};

pub(crate) const EFFECT_CHORUS: u32 = 0;
pub(crate) const EFFECT_REVERB: u32 = 1;

/// `D77_SETTINGS`: fifteen 32-bit fields, 4-byte packing.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct D77Settings {
    pub sampling_freq: u32,
    pub polyphony: u32,
    pub cpu_load_low: u32,
    pub cpu_load_high: u32,
    pub reverb_switch: u32,
    pub chorus_switch: u32,
    pub master_volume: u32,
    pub reverb_adjust: u32,
    pub chorus_adjust: u32,
    pub output_level: u32,
    pub reverb_feedback: u32,
    pub reverb_drum: u32,
    pub reso_up_adjust: u32,
    pub cache_size: u32,
    pub time_reso: u32,
}

impl From<&Settings> for D77Settings {
    fn from(s: &Settings) -> Self {
        Self {
            sampling_freq: s.sample_rate,
            polyphony: s.polyphony,
            cpu_load_low: s.cpu_load_low,
            cpu_load_high: s.cpu_load_high,
            reverb_switch: u32::from(s.reverb),
            chorus_switch: u32::from(s.chorus),
            master_volume: s.master_volume,
            reverb_adjust: s.reverb_adjust,
            chorus_adjust: s.chorus_adjust,
            output_level: s.output_level,
            reverb_feedback: s.reverb_feedback,
            reverb_drum: s.reverb_drum,
            reso_up_adjust: s.resonance_up_adjust,
            cache_size: s.cache_size,
            time_reso: s.time_resolution,
        }
    }
}

impl D77Settings {
    /// Copy the driver's corrections back.
    pub fn apply_to(&self, s: &mut Settings) {
        s.sample_rate = self.sampling_freq;
        s.polyphony = self.polyphony;
        s.cpu_load_low = self.cpu_load_low;
        s.cpu_load_high = self.cpu_load_high;
        s.reverb = self.reverb_switch != 0;
        s.chorus = self.chorus_switch != 0;
        s.master_volume = self.master_volume;
        s.reverb_adjust = self.reverb_adjust;
        s.chorus_adjust = self.chorus_adjust;
        s.output_level = self.output_level;
        s.reverb_feedback = self.reverb_feedback;
        s.reverb_drum = self.reverb_drum;
        s.resonance_up_adjust = self.reso_up_adjust;
        s.cache_size = self.cache_size;
        s.time_resolution = self.time_reso;
    }
}

/// `D77_PARAMETERS`: six 16-bit fields, no padding.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct D77Parameters {
    pub chorus_adjust: u16,
    pub reverb_adjust: u16,
    pub reverb_drum: u16,
    pub reverb_feedback: u16,
    pub output_level: u16,
    pub reso_up_adjust: u16,
}

impl From<&Parameters> for D77Parameters {
    fn from(p: &Parameters) -> Self {
        Self {
            chorus_adjust: p.chorus_adjust,
            reverb_adjust: p.reverb_adjust,
            reverb_drum: p.reverb_drum,
            reverb_feedback: p.reverb_feedback,
            output_level: p.output_level,
            reso_up_adjust: p.resonance_up_adjust,
        }
    }
}

type InitializePointerOffsetFn = unsafe extern "C" fn() -> i32;
type ValidateSettingsFn = unsafe extern "C" fn(*mut D77Settings);
type InitializeDataFileFn = unsafe extern "C" fn(*const u8, u32) -> i32;
type InitializeSynthFn = unsafe extern "C" fn(u32, u32, u32) -> i32;
type InitializeUnknownFn = unsafe extern "C" fn(u32);
type InitializeEffectFn = unsafe extern "C" fn(u32, u32);
type InitializeCpuLoadFn = unsafe extern "C" fn(u32, u32);
type InitializeParametersFn = unsafe extern "C" fn(*const D77Parameters);
type InitializeMasterVolumeFn = unsafe extern "C" fn(u32);
type GetRenderedSamplesPerCallFn = unsafe extern "C" fn() -> u32;
type MidiMessageShortFn = unsafe extern "C" fn(u32) -> i32;
type MidiMessageLongFn = unsafe extern "C" fn(*const u8, u32) -> i32;
type RenderSamplesFn = unsafe extern "C" fn(*mut i16) -> i32;
type AllocateMemoryFn = unsafe extern "C" fn(u32) -> *mut c_void;
type FreeMemoryFn = unsafe extern "C" fn(*mut c_void, u32);

/// Resolved entry points. The function pointers stay valid for as long as
/// `_library` is loaded.
pub(crate) struct Api {
    pub initialize_pointer_offset: InitializePointerOffsetFn,
    pub validate_settings: ValidateSettingsFn,
    pub initialize_data_file: InitializeDataFileFn,
    pub initialize_synth: InitializeSynthFn,
    pub initialize_unknown: InitializeUnknownFn,
    pub initialize_effect: InitializeEffectFn,
    pub initialize_cpu_load: InitializeCpuLoadFn,
    pub initialize_parameters: InitializeParametersFn,
    pub initialize_master_volume: InitializeMasterVolumeFn,
    pub get_rendered_samples_per_call: GetRenderedSamplesPerCallFn,
    pub midi_message_short: MidiMessageShortFn,
    pub midi_message_long: MidiMessageLongFn,
    pub render_samples: RenderSamplesFn,
    pub allocate_memory: AllocateMemoryFn,
    pub free_memory: FreeMemoryFn,
    _library: Library,
}

impl Api {
    /// Resolve every symbol up front so a partial library fails at load.
    ///
    /// # Safety
    /// `library` must be a `d77_coredrv` build whose exports have the
    /// signatures declared above.
    pub unsafe fn resolve(library: Library) -> Result<Self> {
        Ok(Self {
            initialize_pointer_offset: symbol(&library, "D77_InitializePointerOffset")?,
            validate_settings: symbol(&library, "D77_ValidateSettings")?,
            initialize_data_file: symbol(&library, "D77_InitializeDataFile")?,
            initialize_synth: symbol(&library, "D77_InitializeSynth")?,
            initialize_unknown: symbol(&library, "D77_InitializeUnknown")?,
            initialize_effect: symbol(&library, "D77_InitializeEffect")?,
            initialize_cpu_load: symbol(&library, "D77_InitializeCpuLoad")?,
            initialize_parameters: symbol(&library, "D77_InitializeParameters")?,
            initialize_master_volume: symbol(&library, "D77_InitializeMasterVolume")?,
            get_rendered_samples_per_call: symbol(&library, "D77_GetRenderedSamplesPerCall")?,
            midi_message_short: symbol(&library, "D77_MidiMessageShort")?,
            midi_message_long: symbol(&library, "D77_MidiMessageLong")?,
            render_samples: symbol(&library, "D77_RenderSamples")?,
            allocate_memory: symbol(&library, "D77_AllocateMemory")?,
            free_memory: symbol(&library, "D77_FreeMemory")?,
            _library: library,
        })
    }
}

unsafe fn symbol<T: Copy>(library: &Library, name: &'static str) -> Result<T> {
    library
        .get::<T>(name.as_bytes())
        .map(|symbol| *symbol)
        .map_err(|source| DriverError::Symbol { name, source })
}
