use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig,
};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use thiserror::Error;

use super::{BLOCK_DURATION_MS, BLOCK_SIZE, SAMPLE_RATE};

#[derive(Error, Debug)]
pub enum AudioCaptureError {
    #[error("Audio device error: {0}")]
    Device(String),
    #[error("Audio stream error: {0}")]
    Stream(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Resampling error: {0}")]
    Resampling(String),
}

/// One block of captured audio, interleaved when `channels > 1`
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl Frame {
    pub fn mono(samples: Vec<f32>) -> Self {
        Self {
            channels: 1,
            samples,
        }
    }
}

/// Called from the capture thread once per block
pub type FrameCallback = Box<dyn FnMut(Frame) + Send + 'static>;

/// A source of fixed-size audio blocks.
///
/// `start` begins delivering frames to the callback on a background thread;
/// `stop` tears the stream down. After `stop` returns no further frames arrive.
pub trait AudioSource {
    fn start(&mut self, on_frame: FrameCallback) -> Result<(), AudioCaptureError>;
    fn stop(&mut self);
    /// Rate of the delivered frames
    fn sample_rate(&self) -> u32;
}

/// Audio device information
#[derive(Debug, Clone)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub is_default: bool,
    pub channel_count: u16,
    pub default_sample_rate: u32,
}

/// List input devices on the default host
pub fn list_devices() -> Result<Vec<AudioDeviceInfo>, AudioCaptureError> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let devices = host
        .input_devices()
        .map_err(|e| AudioCaptureError::Device(format!("Failed to enumerate devices: {}", e)))?;

    let mut result = Vec::new();
    for device in devices {
        let Ok(name) = device.name() else { continue };
        match device.default_input_config() {
            Ok(config) => result.push(AudioDeviceInfo {
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
                channel_count: config.channels(),
                default_sample_rate: config.sample_rate().0,
            }),
            Err(e) => log::debug!("Skipping device {}: {}", name, e),
        }
    }

    Ok(result)
}

/// Average interleaved channels down to mono
pub fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Turns device-rate mono audio into [`BLOCK_SIZE`] blocks at [`SAMPLE_RATE`].
///
/// Input is resampled in 100 ms chunks of the device rate with a band-limited
/// sinc filter; output is re-cut so every frame has exactly one block.
pub struct BlockResampler {
    resampler: Option<SincFixedIn<f32>>,
    chunk_size: usize,
    input: Vec<f32>,
    output: Vec<f32>,
}

impl BlockResampler {
    pub fn new(device_rate: u32) -> Result<Self, AudioCaptureError> {
        let chunk_size = ((device_rate as usize * BLOCK_DURATION_MS as usize) / 1000).max(1);

        let resampler = if device_rate != SAMPLE_RATE {
            let ratio = SAMPLE_RATE as f64 / device_rate as f64;
            let params = SincInterpolationParameters {
                sinc_len: 256,
                f_cutoff: 0.95,
                interpolation: SincInterpolationType::Linear,
                oversampling_factor: 256,
                window: WindowFunction::BlackmanHarris2,
            };
            let resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_size, 1)
                .map_err(|e| AudioCaptureError::Resampling(e.to_string()))?;

            log::info!(
                "🔄 Created resampler: {}Hz → {}Hz (ratio: {:.3})",
                device_rate,
                SAMPLE_RATE,
                ratio
            );
            Some(resampler)
        } else {
            None
        };

        Ok(Self {
            resampler,
            chunk_size,
            input: Vec::with_capacity(chunk_size * 2),
            output: Vec::with_capacity(BLOCK_SIZE * 2),
        })
    }

    /// Feed mono samples; returns every block completed so far
    pub fn push(&mut self, samples: &[f32]) -> Vec<Frame> {
        self.input.extend_from_slice(samples);

        while self.input.len() >= self.chunk_size {
            let chunk: Vec<f32> = self.input.drain(..self.chunk_size).collect();
            match self.resampler.as_mut() {
                Some(resampler) => match resampler.process(&[chunk], None) {
                    Ok(channels) => {
                        if let Some(mono) = channels.into_iter().next() {
                            self.output.extend(mono);
                        }
                    }
                    Err(e) => log::error!("Resampling error: {}", e),
                },
                None => self.output.extend(chunk),
            }
        }

        let mut frames = Vec::new();
        while self.output.len() >= BLOCK_SIZE {
            frames.push(Frame::mono(self.output.drain(..BLOCK_SIZE).collect()));
        }
        frames
    }
}

/// Microphone capture through CPAL, delivering 100 ms mono blocks at 16 kHz.
///
/// Devices that cannot open at 16 kHz are captured at their default rate and
/// resampled through [`BlockResampler`].
pub struct CpalAudioSource {
    device: Device,
    stream_config: StreamConfig,
    sample_format: SampleFormat,
    stream: Option<Stream>,
}

impl CpalAudioSource {
    pub fn new(device_name: Option<&str>) -> Result<Self, AudioCaptureError> {
        let host = cpal::default_host();

        let device = if let Some(name) = device_name {
            host.input_devices()
                .map_err(|e| {
                    AudioCaptureError::Device(format!("Failed to enumerate devices: {}", e))
                })?
                .find(|dev| dev.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| AudioCaptureError::Device(format!("Device '{}' not found", name)))?
        } else {
            host.default_input_device().ok_or_else(|| {
                AudioCaptureError::Device("No default input device available".to_string())
            })?
        };

        let supported_configs: Vec<_> = device
            .supported_input_configs()
            .map_err(|e| AudioCaptureError::Config(format!("Failed to get configs: {}", e)))?
            .collect();

        // Prefer a config that natively runs at 16kHz
        let native = supported_configs.iter().find(|config| {
            config.min_sample_rate().0 <= SAMPLE_RATE && config.max_sample_rate().0 >= SAMPLE_RATE
        });

        let supported_config = match native {
            Some(config) => {
                log::info!("Found config with native 16kHz support: {:?}", config.sample_format());
                config.clone().with_sample_rate(cpal::SampleRate(SAMPLE_RATE))
            }
            None => {
                let config = device
                    .default_input_config()
                    .map_err(|e| AudioCaptureError::Config(e.to_string()))?;
                log::info!(
                    "Using default config with resampling: {:?} @ {}Hz",
                    config.sample_format(),
                    config.sample_rate().0
                );
                config
            }
        };

        let sample_format = supported_config.sample_format();
        let stream_config: StreamConfig = supported_config.into();

        log::info!(
            "🎤 Audio capture configured on '{}': {} channels @ {}Hz",
            device.name().unwrap_or_else(|_| "Unknown Device".to_string()),
            stream_config.channels,
            stream_config.sample_rate.0
        );

        Ok(Self {
            device,
            stream_config,
            sample_format,
            stream: None,
        })
    }

    pub fn device_name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "Unknown Device".to_string())
    }

    fn build_stream<T>(&self, mut on_frame: FrameCallback) -> Result<Stream, AudioCaptureError>
    where
        T: Sample + SizedSample + Send + Sync + 'static,
        f32: FromSample<T>,
    {
        let channels = usize::from(self.stream_config.channels.max(1));
        let mut resampler = BlockResampler::new(self.stream_config.sample_rate.0)?;

        self.device
            .build_input_stream(
                &self.stream_config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    let converted: Vec<f32> = data.iter().map(|s| f32::from_sample(*s)).collect();
                    for frame in resampler.push(&downmix(&converted, channels)) {
                        on_frame(frame);
                    }
                },
                |err| log::error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| AudioCaptureError::Stream(e.to_string()))
    }
}

impl AudioSource for CpalAudioSource {
    fn start(&mut self, on_frame: FrameCallback) -> Result<(), AudioCaptureError> {
        self.stop();

        let stream = match self.sample_format {
            SampleFormat::I16 => self.build_stream::<i16>(on_frame)?,
            SampleFormat::U16 => self.build_stream::<u16>(on_frame)?,
            SampleFormat::F32 => self.build_stream::<f32>(on_frame)?,
            format => {
                return Err(AudioCaptureError::Config(format!(
                    "Unsupported format: {:?}",
                    format
                )));
            }
        };

        stream
            .play()
            .map_err(|e| AudioCaptureError::Stream(format!("Failed to start stream: {}", e)))?;

        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                log::debug!("Failed to pause audio stream: {}", e);
            }
            drop(stream);
        }
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }
}

impl Drop for CpalAudioSource {
    fn drop(&mut self) {
        self.stop();
    }
}
