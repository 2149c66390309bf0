//! Real-time audio output via cpal.

use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, Stream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Extract device name via `description()` (cpal 0.17+).
pub(crate) fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Output device information.
#[derive(Debug, Clone)]
pub struct AudioDevice {
    /// Human-readable device name.
    pub name: String,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
}

/// Output stream configuration.
#[derive(Debug, Clone, Default)]
pub struct StreamConfig {
    /// Sample rate in Hz (device default if `None`).
    pub sample_rate: Option<u32>,
    /// Output device: index, exact name or partial name (default if `None`).
    pub output_device: Option<String>,
}

/// List the available output devices.
pub fn list_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let Ok(outputs) = host.output_devices() else {
        return Ok(Vec::new());
    };

    Ok(outputs
        .filter_map(|device| {
            let name = device_name(&device).ok()?;
            let default_sample_rate = device
                .default_output_config()
                .map(|c| c.sample_rate())
                .unwrap_or(48000);
            Some(AudioDevice {
                name,
                default_sample_rate,
            })
        })
        .collect())
}

/// Get the default output device info, if there is one.
pub fn default_device() -> Result<Option<AudioDevice>> {
    let host = cpal::default_host();

    Ok(host.default_output_device().and_then(|d| {
        device_name(&d).ok().map(|name| AudioDevice {
            name,
            default_sample_rate: d
                .default_output_config()
                .map(|c| c.sample_rate())
                .unwrap_or(48000),
        })
    }))
}

/// Real-time output stream.
pub struct AudioStream {
    output_device: Device,
    sample_rate: u32,
    channels: u16,
    running: Arc<AtomicBool>,
    _output_stream: Option<Stream>,
}

impl AudioStream {
    /// Open an output device with the given configuration.
    pub fn new(config: StreamConfig) -> Result<Self> {
        let host = cpal::default_host();

        let output_device = match &config.output_device {
            Some(name) => find_output_device(&host, name)?,
            None => host.default_output_device().ok_or(Error::NoDevice)?,
        };

        let default_config = output_device
            .default_output_config()
            .map_err(|e| Error::Stream(e.to_string()))?;
        let sample_rate = config.sample_rate.unwrap_or(default_config.sample_rate());
        let channels = default_config.channels();

        let name = device_name(&output_device).unwrap_or_default();
        tracing::info!(
            host = host.id().name(),
            device = %name,
            sample_rate,
            channels,
            "output device opened"
        );

        Ok(Self {
            output_device,
            sample_rate,
            channels,
            running: Arc::new(AtomicBool::new(false)),
            _output_stream: None,
        })
    }

    /// Sample rate the stream runs at.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Output device channel count.
    pub fn output_channels(&self) -> u16 {
        self.channels
    }

    /// Shared running flag.
    ///
    /// Clearing it from another thread (a Ctrl+C handler, say) makes
    /// [`run_output`](Self::run_output) return.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Run an output stream, calling `generate` to fill each device buffer.
    ///
    /// The buffer is interleaved `f32` with [`output_channels`](Self::output_channels)
    /// channels. Blocks until the stream is stopped.
    pub fn run_output<F>(&mut self, mut generate: F) -> Result<()>
    where
        F: FnMut(&mut [f32]) + Send + 'static,
    {
        let mut stream_config: cpal::StreamConfig = self
            .output_device
            .default_output_config()
            .map_err(|e| Error::Stream(e.to_string()))?
            .into();
        stream_config.sample_rate = self.sample_rate;

        self.running.store(true, Ordering::SeqCst);

        let output_running = Arc::clone(&self.running);
        let output_stream = self
            .output_device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if output_running.load(Ordering::SeqCst) {
                        generate(data);
                    } else {
                        data.fill(0.0);
                    }
                },
                |err| tracing::error!(%err, "output stream error"),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        output_stream
            .play()
            .map_err(|e| Error::Stream(e.to_string()))?;
        self._output_stream = Some(output_stream);

        while self.running.load(Ordering::SeqCst) {
            std::thread::sleep(std::time::Duration::from_millis(100));
        }

        self._output_stream = None;
        tracing::debug!("output stream stopped");
        Ok(())
    }

    /// Stop the audio stream.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the stream is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Copy interleaved stereo `i16` frames into an interleaved `f32` device
/// buffer with `channels` channels.
///
/// Mono devices get the average of both channels; channels past the second
/// are silenced. Returns the number of frames written, the smaller of the
/// frames available in `src` and the frames that fit in `dst`.
pub fn write_frames(src: &[i16], dst: &mut [f32], channels: usize) -> usize {
    if channels == 0 {
        return 0;
    }
    let frames = (src.len() / 2).min(dst.len() / channels);
    let scale = 1.0 / 32768.0;

    for (frame, out) in src
        .chunks_exact(2)
        .zip(dst.chunks_exact_mut(channels))
        .take(frames)
    {
        let l = f32::from(frame[0]) * scale;
        let r = f32::from(frame[1]) * scale;
        match channels {
            1 => out[0] = (l + r) * 0.5,
            _ => {
                out[0] = l;
                out[1] = r;
                out[2..].fill(0.0);
            }
        }
    }
    frames
}

/// Find an output device by exact name, partial name, or index.
///
/// The `name_or_index` can be:
/// - A numeric index (e.g., "0", "1")
/// - An exact device name
/// - A partial device name (case-insensitive fuzzy match)
fn find_output_device(host: &Host, name_or_index: &str) -> Result<Device> {
    let devices: Vec<_> = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?
        .collect();

    find_device_from_list(&devices, name_or_index)
}

/// Find a device from a list by index, exact name, or fuzzy match.
fn find_device_from_list(devices: &[Device], name_or_index: &str) -> Result<Device> {
    if let Ok(index) = name_or_index.parse::<usize>() {
        return devices.get(index).cloned().ok_or_else(|| {
            Error::DeviceNotFound(format!(
                "output device index {} (only {} devices available)",
                index,
                devices.len()
            ))
        });
    }

    for device in devices {
        if device_name(device).is_ok_and(|n| n == name_or_index) {
            return Ok(device.clone());
        }
    }

    let search_lower = name_or_index.to_lowercase();
    let mut matches: Vec<_> = devices
        .iter()
        .filter_map(|d| {
            device_name(d)
                .ok()
                .filter(|name| name.to_lowercase().contains(&search_lower))
                .map(|name| (d.clone(), name))
        })
        .collect();

    match matches.len() {
        0 => Err(Error::DeviceNotFound(format!(
            "no output device matching '{}'",
            name_or_index
        ))),
        1 => Ok(matches.remove(0).0),
        _ => {
            let names: Vec<_> = matches.iter().map(|(_, n)| n.as_str()).collect();
            tracing::warn!(
                search = name_or_index,
                ?names,
                chosen = names[0],
                "multiple output devices match, using first"
            );
            Ok(matches.remove(0).0)
        }
    }
}
