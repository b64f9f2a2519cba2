//! Live playback via PortAudio.
//!
//! - Blocking I/O model: `write` returns once the samples are queued
//! - `close` drains with `Pa_StopStream`; `abort` uses `Pa_AbortStream`, which
//!   also releases a writer blocked in `Pa_WriteStream`
//! - Opens the default output device, mono, in the stream's own sample format
//!   (paFloat32 or paInt16)
//! - Links against the system portaudio library (see `build.rs`)
//!
//! # Example
//!
//! ```ignore
//! use narrator_audio::playback::OutputDevice;
//! use narrator_audio::portaudio::PortAudioDevice;
//! use narrator_audio::{AudioFormat, SampleFormat, Samples};
//!
//! let mut device = PortAudioDevice::new();
//! let session = device.open(&AudioFormat::mono(SampleFormat::Float, 24000))?;
//! session.write(&Samples::F32(vec![0.0; 2400]))?;
//! session.close()?;
//! ```

pub(crate) mod ffi;

use crate::pcm::{AudioFormat, SampleFormat, Samples};
use crate::playback::{OutputDevice, OutputSession};
use serde::Serialize;
use std::ffi::CStr;
use std::io;
use std::os::raw::{c_int, c_ulong, c_void};
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use tracing::debug;

static INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// Initializes PortAudio. Safe to call multiple times.
fn initialize() -> io::Result<()> {
    let result = INIT.get_or_init(|| {
        let err = unsafe { ffi::Pa_Initialize() };
        if err == ffi::PA_NO_ERROR {
            Ok(())
        } else {
            Err(pa_error_string(err))
        }
    });

    match result {
        Ok(()) => Ok(()),
        Err(e) => Err(io::Error::other(e.clone())),
    }
}

fn pa_error_string(code: ffi::PaError) -> String {
    unsafe {
        let ptr = ffi::Pa_GetErrorText(code);
        if ptr.is_null() {
            return format!("portaudio error {}", code);
        }
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

fn pa_check(code: ffi::PaError) -> io::Result<()> {
    if code == ffi::PA_NO_ERROR {
        Ok(())
    } else {
        Err(io::Error::other(pa_error_string(code)))
    }
}

/// Information about an output device.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceInfo {
    pub index: usize,
    pub name: String,
    pub max_output_channels: u32,
    pub default_low_output_latency: f64,
    pub default_sample_rate: f64,
    pub is_default_output: bool,
}

/// Lists devices with at least one output channel.
pub fn list_output_devices() -> io::Result<Vec<DeviceInfo>> {
    initialize()?;

    let count = unsafe { ffi::Pa_GetDeviceCount() };
    if count < 0 {
        return Err(io::Error::other(pa_error_string(count)));
    }

    let default_output = unsafe { ffi::Pa_GetDefaultOutputDevice() };

    let mut devices = Vec::with_capacity(count as usize);
    for i in 0..count {
        let info = unsafe { ffi::Pa_GetDeviceInfo(i) };
        if info.is_null() {
            continue;
        }
        let info = unsafe { &*info };
        if info.max_output_channels <= 0 {
            continue;
        }
        let name = unsafe { CStr::from_ptr(info.name) }
            .to_string_lossy()
            .into_owned();

        devices.push(DeviceInfo {
            index: i as usize,
            name,
            max_output_channels: info.max_output_channels as u32,
            default_low_output_latency: info.default_low_output_latency,
            default_sample_rate: info.default_sample_rate,
            is_default_output: i == default_output,
        });
    }
    Ok(devices)
}

/// The default PortAudio output device.
#[derive(Debug, Clone)]
pub struct PortAudioDevice {
    frames_per_buffer: usize,
}

impl Default for PortAudioDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl PortAudioDevice {
    /// Creates a device handle; nothing is opened until [`OutputDevice::open`].
    pub fn new() -> Self {
        Self {
            frames_per_buffer: 1024,
        }
    }

}

impl OutputDevice for PortAudioDevice {
    fn open(&mut self, format: &AudioFormat) -> io::Result<Box<dyn OutputSession>> {
        initialize()?;

        let device = unsafe { ffi::Pa_GetDefaultOutputDevice() };
        if device == ffi::PA_NO_DEVICE {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no default output device"));
        }
        let info = unsafe { ffi::Pa_GetDeviceInfo(device) };
        if info.is_null() {
            return Err(io::Error::other("failed to get output device info"));
        }

        let params = ffi::PaStreamParameters {
            device,
            channel_count: format.channels as c_int,
            sample_format: match format.sample_format {
                SampleFormat::Float => ffi::PA_FLOAT32,
                SampleFormat::PcmInt => ffi::PA_INT16,
            },
            suggested_latency: unsafe { (*info).default_low_output_latency },
            host_api_specific_stream_info: ptr::null_mut(),
        };

        let mut pa_stream: *mut c_void = ptr::null_mut();
        pa_check(unsafe {
            ffi::Pa_OpenStream(
                &mut pa_stream,
                ptr::null(),
                &params,
                format.sample_rate as f64,
                self.frames_per_buffer as c_ulong,
                ffi::PA_CLIP_OFF,
                ptr::null(),
                ptr::null_mut(),
            )
        })?;

        if let Err(e) = pa_check(unsafe { ffi::Pa_StartStream(pa_stream) }) {
            unsafe {
                ffi::Pa_CloseStream(pa_stream);
            }
            return Err(e);
        }

        debug!(
            sample_rate = format.sample_rate,
            bit_depth = format.bit_depth,
            "portaudio: output stream started"
        );
        Ok(Box::new(PortAudioSession {
            pa_stream,
            format: *format,
            stopped: AtomicBool::new(false),
        }))
    }
}

/// An open PortAudio output stream.
///
/// The stream is stopped by `close` or `abort` and released on drop, once no
/// writer can still be inside `Pa_WriteStream`.
pub struct PortAudioSession {
    pa_stream: *mut c_void,
    format: AudioFormat,
    stopped: AtomicBool,
}

// The stream pointer is owned by this session. Concurrent callers only race
// `Pa_WriteStream` against a single stop or abort; `Pa_CloseStream` runs in
// `drop`.
unsafe impl Send for PortAudioSession {}
unsafe impl Sync for PortAudioSession {}

impl PortAudioSession {
    fn write_raw(&self, buffer: *const c_void, samples: usize) -> io::Result<()> {
        let frames = samples / self.format.channels.max(1) as usize;
        if frames == 0 {
            return Ok(());
        }
        pa_check(unsafe { ffi::Pa_WriteStream(self.pa_stream, buffer, frames as c_ulong) })
    }
}

impl OutputSession for PortAudioSession {
    fn write(&self, samples: &Samples) -> io::Result<()> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(io::Error::other("stream closed"));
        }

        // The stream format is fixed at open time; buffers of the other known
        // element type are converted to it.
        match self.format.sample_format {
            SampleFormat::Float => {
                let data = samples.to_f32().ok_or_else(|| unsupported(samples))?;
                self.write_raw(data.as_ptr() as *const c_void, data.len())
            }
            SampleFormat::PcmInt => {
                let data = samples.to_i16().ok_or_else(|| unsupported(samples))?;
                self.write_raw(data.as_ptr() as *const c_void, data.len())
            }
        }
    }

    fn close(&self) -> io::Result<()> {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        pa_check(unsafe { ffi::Pa_StopStream(self.pa_stream) })
    }

    fn abort(&self) -> io::Result<()> {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        debug!("portaudio: aborting output stream");
        pa_check(unsafe { ffi::Pa_AbortStream(self.pa_stream) })
    }
}

impl Drop for PortAudioSession {
    fn drop(&mut self) {
        let _ = self.abort();
        unsafe {
            ffi::Pa_CloseStream(self.pa_stream);
        }
    }
}

fn unsupported(samples: &Samples) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("unsupported sample type: {}", samples.kind()),
    )
}
