//! Engine settings and bridge configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable overriding the data file path in [`BridgeConfig::from_env`].
pub const DATA_FILE_ENV: &str = "SYNTHBRIDGE_DATA_FILE";

pub const DEFAULT_DATA_FILE: &str = "dswebWDM.dat";

/// Default output ring size: 2048 stereo frames (8192 bytes of 16-bit PCM).
pub const DEFAULT_BUFFER_FRAMES: usize = 2048;

/// Initialization settings for the synthesis engine.
///
/// Built once per open, validated, handed to the engine's own validator and
/// then only read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sample_rate: u32,
    pub polyphony: u32,
    pub cpu_load_low: u32,
    pub cpu_load_high: u32,
    pub reverb: bool,
    pub chorus: bool,
    pub master_volume: u32,
    pub reverb_adjust: u32,
    pub chorus_adjust: u32,
    pub output_level: u32,
    pub reverb_feedback: u32,
    pub reverb_drum: u32,
    pub resonance_up_adjust: u32,
    pub cache_size: u32,
    pub time_resolution: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            polyphony: 64,
            cpu_load_low: 60,
            cpu_load_high: 90,
            reverb: true,
            chorus: true,
            master_volume: 100,
            reverb_adjust: 95,
            chorus_adjust: 70,
            output_level: 110,
            reverb_feedback: 95,
            reverb_drum: 80,
            resonance_up_adjust: 40,
            cache_size: 3,
            time_resolution: 80,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if !(8000..=192_000).contains(&self.sample_rate) {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-192000 Hz)",
                self.sample_rate
            )));
        }
        if !(1..=crate::capability::MAX_POLYPHONY).contains(&self.polyphony) {
            return Err(Error::InvalidConfig(format!(
                "polyphony {} out of range (1-{})",
                self.polyphony,
                crate::capability::MAX_POLYPHONY
            )));
        }
        if self.cpu_load_low > self.cpu_load_high || self.cpu_load_high > 100 {
            return Err(Error::InvalidConfig(format!(
                "cpu load bounds {}/{} must satisfy low <= high <= 100",
                self.cpu_load_low, self.cpu_load_high
            )));
        }
        if self.time_resolution == 0 {
            return Err(Error::InvalidConfig("time_resolution must be > 0".into()));
        }
        if self.cache_size == 0 {
            return Err(Error::InvalidConfig("cache_size must be > 0".into()));
        }
        Ok(())
    }

    /// Effect tuning values in the engine's 16-bit parameter block.
    pub fn parameters(&self) -> Parameters {
        let word = |v: u32| v.min(u32::from(u16::MAX)) as u16;
        Parameters {
            chorus_adjust: word(self.chorus_adjust),
            reverb_adjust: word(self.reverb_adjust),
            reverb_drum: word(self.reverb_drum),
            reverb_feedback: word(self.reverb_feedback),
            output_level: word(self.output_level),
            resonance_up_adjust: word(self.resonance_up_adjust),
        }
    }
}

/// Effect and output tuning passed to `SynthEngine::init_parameters`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Parameters {
    pub chorus_adjust: u16,
    pub reverb_adjust: u16,
    pub reverb_drum: u16,
    pub reverb_feedback: u16,
    pub output_level: u16,
    pub resonance_up_adjust: u16,
}

/// Where the engine's data blob comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DataSource {
    Path(PathBuf),
    /// In-memory blob, e.g. embedded with `include_bytes!`.
    #[serde(skip)]
    Bytes(Arc<[u8]>),
}

impl DataSource {
    /// Read the blob. Paths are read fresh on every call.
    pub fn load(&self) -> Result<Cow<'_, [u8]>> {
        match self {
            DataSource::Path(path) => std::fs::read(path)
                .map(Cow::Owned)
                .map_err(|source| Error::DataFile {
                    path: path.clone(),
                    source,
                }),
            DataSource::Bytes(bytes) => Ok(Cow::Borrowed(&bytes[..])),
        }
    }
}

impl Default for DataSource {
    fn default() -> Self {
        DataSource::Path(PathBuf::from(DEFAULT_DATA_FILE))
    }
}

impl From<PathBuf> for DataSource {
    fn from(path: PathBuf) -> Self {
        DataSource::Path(path)
    }
}

impl From<Vec<u8>> for DataSource {
    fn from(bytes: Vec<u8>) -> Self {
        DataSource::Bytes(bytes.into())
    }
}

/// Configuration for a bridge session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub data: DataSource,
    pub settings: Settings,
    /// Output device index; `None` selects the host default.
    pub output_device: Option<usize>,
    /// Output ring size in stereo frames.
    pub buffer_frames: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            data: DataSource::default(),
            settings: Settings::default(),
            output_device: None,
            buffer_frames: DEFAULT_BUFFER_FRAMES,
        }
    }
}

impl BridgeConfig {
    /// Defaults, with the data file taken from `SYNTHBRIDGE_DATA_FILE` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(path) = std::env::var_os(DATA_FILE_ENV) {
            config.data = DataSource::Path(path.into());
        }
        config
    }

    pub fn validate(&self) -> Result<()> {
        self.settings.validate()?;
        if self.buffer_frames == 0 {
            return Err(Error::InvalidConfig("buffer_frames must be > 0".into()));
        }
        Ok(())
    }
}
