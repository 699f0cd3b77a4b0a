//! CPAL-based audio output for desktop platforms (Linux, macOS, Windows)
//!
//! Opens the default output device once at startup and keeps the stream
//! alive for the lifetime of the [`CpalSink`]. Clicks reach the real-time
//! callback through the lock-free [`voice_queue`](super::mixer::voice_queue).

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::click::ClickWaveform;
use super::mixer::{voice_queue, Mixer, VoiceQueue};
use super::sink::AudioSink;
use crate::config::AudioConfig;
use crate::error::{log_audio_error, AudioError};

/// Audio output backed by the default cpal device.
pub struct CpalSink {
    /// Output audio stream, `None` once shut down
    stream: Option<cpal::Stream>,
    /// Event-loop side of the click queues
    voices: VoiceQueue,
    /// Sample rate the device actually runs at
    sample_rate: u32,
    channels: u16,
    device_name: String,
}

impl CpalSink {
    /// Acquire the default output device and start a silent stream.
    ///
    /// # Arguments
    /// * `sample_rate` - Requested rate in Hz; the device default is used if unsupported
    /// * `buffer_size` - Requested buffer size in frames
    /// * `max_voices` - Clicks mixed at once
    ///
    /// # Errors
    /// - `InvalidConfig` if any argument is zero
    /// - `DeviceUnavailable` if there is no default output device
    /// - `UnsupportedSampleFormat` if the device cannot take f32 samples
    /// - `StreamOpenFailed` / `HardwareError` if the stream cannot be built or started
    pub fn init(sample_rate: u32, buffer_size: u32, max_voices: usize) -> Result<Self, AudioError> {
        validate_audio_settings(sample_rate, buffer_size, max_voices)?;

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::DeviceUnavailable {
                reason: "No default output device found".to_string(),
            })?;
        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

        let supported = select_output_config(&device, sample_rate)?;
        if supported.sample_format() != cpal::SampleFormat::F32 {
            return Err(AudioError::UnsupportedSampleFormat {
                format: format!("{:?}", supported.sample_format()),
            });
        }

        let buffer = match supported.buffer_size() {
            cpal::SupportedBufferSize::Range { min, max } if (*min..=*max).contains(&buffer_size) => {
                cpal::BufferSize::Fixed(buffer_size)
            }
            _ => {
                log::warn!(
                    "[CpalSink] Buffer size {} not supported by {}, using device default",
                    buffer_size,
                    device_name
                );
                cpal::BufferSize::Default
            }
        };

        let stream_config = cpal::StreamConfig {
            channels: supported.channels(),
            sample_rate: supported.sample_rate(),
            buffer_size: buffer,
        };

        let (voices, mixer) = voice_queue(max_voices);
        let stream = build_stream(&device, &stream_config, mixer)?;
        stream.play().map_err(|e| AudioError::HardwareError {
            details: format!("Output start failed: {}", e),
        })?;

        log::info!(
            "[CpalSink] Output started on {} ({} Hz, {} channels)",
            device_name,
            stream_config.sample_rate.0,
            stream_config.channels
        );

        Ok(Self {
            stream: Some(stream),
            voices,
            sample_rate: stream_config.sample_rate.0,
            channels: stream_config.channels,
            device_name,
        })
    }

    /// Acquire the output described by the `audio` config section.
    ///
    /// `max_voices` is raised to 1 if configured as 0.
    pub fn from_config(config: &AudioConfig) -> Result<Self, AudioError> {
        Self::init(config.sample_rate, config.buffer_size, config.max_voices.max(1))
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

impl AudioSink for CpalSink {
    fn play(&mut self, waveform: ClickWaveform) -> Result<(), AudioError> {
        if self.stream.is_none() {
            return Err(AudioError::ShutDown);
        }
        self.voices.submit(waveform)
    }

    fn shutdown(&mut self) -> Result<(), AudioError> {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            self.voices.reclaim();
            log::info!("[CpalSink] Output on {} released", self.device_name);
        }
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn is_shut_down(&self) -> bool {
        self.stream.is_none()
    }
}

impl Drop for CpalSink {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

/// Reject settings no device could honour.
pub fn validate_audio_settings(
    sample_rate: u32,
    buffer_size: u32,
    max_voices: usize,
) -> Result<(), AudioError> {
    let reason = if sample_rate == 0 {
        "sample_rate must be greater than 0"
    } else if buffer_size == 0 {
        "buffer_size must be greater than 0"
    } else if max_voices == 0 {
        "max_voices must be greater than 0"
    } else {
        return Ok(());
    };

    let err = AudioError::InvalidConfig {
        reason: reason.to_string(),
    };
    log_audio_error(&err, "validate_audio_settings");
    Err(err)
}

/// Pick an f32 output config at the requested rate, preferring stereo.
///
/// Falls back to the device default when no supported range contains the
/// requested rate.
fn select_output_config(
    device: &cpal::Device,
    sample_rate: u32,
) -> Result<cpal::SupportedStreamConfig, AudioError> {
    let requested = cpal::SampleRate(sample_rate);

    if let Ok(ranges) = device.supported_output_configs() {
        let candidates: Vec<cpal::SupportedStreamConfigRange> = ranges
            .filter(|range| {
                range.sample_format() == cpal::SampleFormat::F32
                    && range.min_sample_rate() <= requested
                    && requested <= range.max_sample_rate()
            })
            .collect();

        let preferred = candidates
            .iter()
            .find(|range| range.channels() == 2)
            .or_else(|| candidates.first());
        if let Some(range) = preferred {
            return Ok(range.clone().with_sample_rate(requested));
        }
    }

    log::warn!(
        "[CpalSink] {} Hz f32 output not offered by device, using default config",
        sample_rate
    );
    device
        .default_output_config()
        .map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("Failed to get default output config: {:?}", e),
        })
}

fn build_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut mixer: Mixer,
) -> Result<cpal::Stream, AudioError> {
    let channels = config.channels as usize;
    let err_fn = |err| log::error!("[CpalSink] Output stream error: {}", err);

    device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                mixer.render(data, channels);
            },
            err_fn,
            None,
        )
        .map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("{:?}", e),
        })
}
