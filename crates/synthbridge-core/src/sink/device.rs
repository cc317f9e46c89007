//! CPAL output device sink.

use super::{AudioFormat, OutputSink, SinkControl};
use crate::pcm;
use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How long a blocked `write` sleeps before checking the ring again.
const WRITE_POLL: Duration = Duration::from_micros(500);

/// Wrapper to hold `cpal::Stream` in a `Send` context.
///
/// # Safety
/// `cpal::Stream` is `!Send` due to platform internals. The handle is only
/// touched by the control thread in `open`/`start`/`stop`/`close`; while the
/// sink lives on the render thread nothing but `write` runs, and `write`
/// never reaches the stream.
struct StreamHandle(cpal::Stream);

unsafe impl Send for StreamHandle {}

/// Sink playing through a CPAL output device.
///
/// Samples travel through a bounded ring between the blocking `write` and
/// the device callback. The callback applies the shared gain and counts
/// the frames it consumed.
pub struct CpalSink {
    device_index: Option<usize>,
    buffer_frames: usize,
    control: Arc<SinkControl>,
    failed: Arc<AtomicBool>,
    producer: Option<HeapProd<i16>>,
    stream: Option<StreamHandle>,
}

impl CpalSink {
    /// `device_index` selects from the host's output devices; `None` uses the
    /// default. `buffer_frames` sizes the ring in stereo frames.
    pub fn new(device_index: Option<usize>, buffer_frames: usize) -> Self {
        Self {
            device_index,
            buffer_frames: buffer_frames.max(1),
            control: Arc::new(SinkControl::new()),
            failed: Arc::new(AtomicBool::new(false)),
            producer: None,
            stream: None,
        }
    }

    pub fn device_name(&self) -> Result<String> {
        get_device(self.device_index)?
            .name()
            .map_err(|e| Error::DeviceUnavailable(e.to_string()))
    }

    pub fn list_devices() -> Result<Vec<String>> {
        cpal::default_host()
            .output_devices()?
            .enumerate()
            .map(|(i, d)| {
                let name = d
                    .name()
                    .map_err(|e| Error::DeviceUnavailable(e.to_string()))?;
                Ok(format!("{i}: {name}"))
            })
            .collect()
    }
}

impl OutputSink for CpalSink {
    fn open(&mut self, format: AudioFormat) -> Result<()> {
        if !format.is_pcm16_stereo() {
            return Err(Error::InvalidConfig(format!(
                "Unsupported output format: {format:?}"
            )));
        }
        self.close();

        let device = get_device(self.device_index)?;
        let default = device.default_output_config()?;
        let config = cpal::StreamConfig {
            channels: default.channels(),
            sample_rate: cpal::SampleRate(format.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let ring = HeapRb::<i16>::new(self.buffer_frames * pcm::CHANNELS);
        let (producer, consumer) = ring.split();

        self.failed.store(false, Ordering::Release);
        let callback = CallbackState {
            consumer,
            control: Arc::clone(&self.control),
        };
        let failed = Arc::clone(&self.failed);

        let stream = match default.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, callback, failed)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, callback, failed)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, callback, failed)?,
            sample_format => {
                return Err(Error::DeviceUnavailable(format!(
                    "Unsupported sample format: {sample_format:?}"
                )));
            }
        };

        self.control.reset(format.sample_rate);
        self.producer = Some(producer);
        self.stream = Some(StreamHandle(stream));
        tracing::debug!(
            sample_rate = format.sample_rate,
            device_channels = config.channels,
            buffer_frames = self.buffer_frames,
            "Output stream opened"
        );
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        let stream = self.stream.as_ref().ok_or(Error::SinkNotOpen)?;
        stream.0.play()?;
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        let producer = self.producer.as_mut().ok_or(Error::SinkNotOpen)?;

        // Whole frames only, so the ring always holds complete left/right pairs.
        let accepted = bytes.len() - bytes.len() % (pcm::CHANNELS * pcm::BYTES_PER_SAMPLE);
        let mut samples = pcm::decode_le(&bytes[..accepted]);
        let mut remaining = accepted / pcm::BYTES_PER_SAMPLE;

        while remaining > 0 {
            if self.failed.load(Ordering::Acquire) {
                return Err(Error::DeviceUnavailable("output stream failed".into()));
            }
            let vacant = producer.vacant_len() & !(pcm::CHANNELS - 1);
            if vacant == 0 {
                std::thread::sleep(WRITE_POLL);
                continue;
            }
            remaining -= producer.push_iter(samples.by_ref().take(vacant.min(remaining)));
        }

        Ok(accepted)
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(stream) = &self.stream {
            stream.0.pause()?;
        }
        Ok(())
    }

    fn close(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("Output stream closed");
        }
        self.producer = None;
    }

    fn control(&self) -> &Arc<SinkControl> {
        &self.control
    }
}

fn get_device(index: Option<usize>) -> Result<cpal::Device> {
    let host = cpal::default_host();

    match index {
        Some(i) => {
            let devices: Vec<_> = host.output_devices()?.collect();
            let count = devices.len();
            devices.into_iter().nth(i).ok_or_else(|| {
                Error::DeviceUnavailable(format!(
                    "Device index {i} out of range ({count} available)"
                ))
            })
        }
        None => host
            .default_output_device()
            .ok_or_else(|| Error::DeviceUnavailable("No output device available".into())),
    }
}

/// Everything the device callback owns.
struct CallbackState {
    consumer: HeapCons<i16>,
    control: Arc<SinkControl>,
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut state: CallbackState,
    failed: Arc<AtomicBool>,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = usize::from(config.channels);

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            fill_output(data, channels, &mut state);
        },
        move |err| {
            tracing::warn!(error = %err, "Output stream error");
            failed.store(true, Ordering::Release);
        },
        None,
    )?;

    Ok(stream)
}

/// Pull stereo frames from the ring into a device buffer of `channels`
/// channels. Missing frames are played as silence.
#[inline]
fn fill_output<T>(data: &mut [T], channels: usize, state: &mut CallbackState)
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let gain = state.control.gain() / 32768.0;
    let mut consumed = 0u64;

    for frame in data.chunks_mut(channels) {
        let (left, right) = if state.consumer.occupied_len() >= pcm::CHANNELS {
            consumed += 1;
            (
                state.consumer.try_pop().unwrap_or(0),
                state.consumer.try_pop().unwrap_or(0),
            )
        } else {
            (0, 0)
        };
        let left = f32::from(left) * gain;
        let right = f32::from(right) * gain;

        match frame {
            [mono] => *mono = T::from_sample((left + right) * 0.5),
            [l, r, rest @ ..] => {
                *l = T::from_sample(left);
                *r = T::from_sample(right);
                for sample in rest {
                    *sample = T::from_sample(0.0f32);
                }
            }
            [] => {}
        }
    }

    state.control.record_frames(consumed);
}
