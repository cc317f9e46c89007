//! Builder wiring the D-77 core driver to the default audio device.

use crate::{Result, Settings};
use std::ops::Deref;
use std::path::PathBuf;
use synthbridge_core::{BridgeConfig, CpalSink, DataSource, Synthesizer};
use synthbridge_d77::CoreDriver;

/// Environment variable naming the core driver library.
pub const LIBRARY_ENV: &str = "SYNTHBRIDGE_LIBRARY";

/// The D-77 synthesizer playing through CPAL.
///
/// Dereferences to [`Synthesizer`], so `open`, `close` and `receiver` are
/// available directly.
///
/// # Example
///
/// ```ignore
/// use synthbridge::prelude::*;
///
/// let synth = SynthBridge::builder()
///     .data(std::path::PathBuf::from("dswebWDM.dat"))
///     .build()?;
/// synth.open()?;
/// synth.receiver().send_short(0x90, 60, 100);
/// ```
pub struct SynthBridge {
    synth: Synthesizer<CoreDriver, CpalSink>,
}

impl SynthBridge {
    /// Builder starting from the defaults.
    pub fn builder() -> SynthBridgeBuilder {
        SynthBridgeBuilder::default()
    }

    /// Builder starting from `SYNTHBRIDGE_DATA_FILE` and
    /// `SYNTHBRIDGE_LIBRARY` where set.
    pub fn from_env() -> SynthBridgeBuilder {
        SynthBridgeBuilder {
            config: BridgeConfig::from_env(),
            library: std::env::var_os(LIBRARY_ENV).map(PathBuf::from),
        }
    }

    pub fn into_inner(self) -> Synthesizer<CoreDriver, CpalSink> {
        self.synth
    }
}

impl Deref for SynthBridge {
    type Target = Synthesizer<CoreDriver, CpalSink>;

    fn deref(&self) -> &Self::Target {
        &self.synth
    }
}

#[derive(Debug, Clone, Default)]
pub struct SynthBridgeBuilder {
    config: BridgeConfig,
    library: Option<PathBuf>,
}

impl SynthBridgeBuilder {
    /// Replace the whole configuration.
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn settings(mut self, settings: Settings) -> Self {
        self.config.settings = settings;
        self
    }

    /// Data file path or in-memory image.
    pub fn data(mut self, data: impl Into<DataSource>) -> Self {
        self.config.data = data.into();
        self
    }

    pub fn output_device(mut self, index: usize) -> Self {
        self.config.output_device = Some(index);
        self
    }

    /// Output ring size in stereo frames. Default: 2048
    pub fn buffer_frames(mut self, frames: usize) -> Self {
        self.config.buffer_frames = frames;
        self
    }

    /// Path of the core driver library. Default: the platform file name of
    /// `d77_coredrv`, resolved through the library search path.
    pub fn library(mut self, path: impl Into<PathBuf>) -> Self {
        self.library = Some(path.into());
        self
    }

    /// Validate the configuration and load the driver. Nothing is opened
    /// until [`Synthesizer::open`].
    pub fn build(self) -> Result<SynthBridge> {
        self.config.validate()?;

        let driver = match &self.library {
            Some(path) => CoreDriver::load(path)?,
            None => CoreDriver::load_default()?,
        };
        let sink = CpalSink::new(self.config.output_device, self.config.buffer_frames);

        tracing::debug!(
            library = ?self.library,
            data = ?self.config.data,
            "Synthesizer configured"
        );

        let synth = Synthesizer::builder(driver, sink)
            .settings(self.config.settings)
            .data(self.config.data)
            .build();
        Ok(SynthBridge { synth })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_invalid_config_rejected_before_loading() {
        let result = SynthBridge::builder()
            .buffer_frames(0)
            .library("/nonexistent/libd77_coredrv.so")
            .build();
        assert!(matches!(
            result,
            Err(Error::Core(synthbridge_core::Error::InvalidConfig(_)))
        ));
    }

    #[test]
    fn test_missing_library() {
        let result = SynthBridge::builder()
            .library("/nonexistent/libd77_coredrv.so")
            .build();
        assert!(matches!(
            result,
            Err(Error::Driver(synthbridge_d77::DriverError::Load { .. }))
        ));
    }
}
