use crate::{
    backend::{CpalCaptureSession, WAV_MIME_TYPE},
    capture::{AudioConstraints, AudioStream, CaptureBackend, DeviceError},
};

use std::sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use cpal::{
    Device, Host, StreamConfig,
    traits::{DeviceTrait, HostTrait},
};
use tracing::{debug, error, info, instrument, warn};

/// Opens streams on the default input device or on a named one.
#[derive(Debug, Clone, Default)]
pub struct CpalBackend {
    selected_device: Option<String>,
}

impl CpalBackend {
    /// Use `selected_device` (a device name or index), or the host default
    /// when `None`.
    pub fn new(selected_device: Option<String>) -> Self {
        Self { selected_device }
    }

    /// Names of the host's input devices, in enumeration order.
    pub fn input_device_names() -> Result<Vec<String>, DeviceError> {
        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .map_err(|e| DeviceError::other(format!("Failed to enumerate devices: {}", e)))?;

        Ok(devices.map(|d| device_name(&d)).collect())
    }
}

#[async_trait]
impl CaptureBackend for CpalBackend {
    type Stream = CpalInputStream;
    type Session = CpalCaptureSession;

    #[instrument(skip(self))]
    async fn request_stream(
        &self,
        constraints: &AudioConstraints,
    ) -> Result<CpalInputStream, DeviceError> {
        if constraints.echo_cancellation
            || constraints.noise_suppression
            || constraints.auto_gain_control
        {
            debug!(?constraints, "Audio processing constraints are not applied by CPAL");
        }

        let selected = self.selected_device.clone();

        // Device enumeration blocks on some hosts.
        tokio::task::spawn_blocking(move || CpalInputStream::open(selected.as_deref()))
            .await
            .map_err(|e| DeviceError::other(format!("Device task failed: {}", e)))?
    }

    fn is_type_supported(&self, mime_type: &str) -> bool {
        mime_type == WAV_MIME_TYPE
    }

    fn create_session(
        &self,
        stream: &CpalInputStream,
        mime_type: Option<&str>,
    ) -> Result<CpalCaptureSession, DeviceError> {
        match mime_type {
            None | Some(WAV_MIME_TYPE) => Ok(CpalCaptureSession::new(stream.clone())),
            Some(other) => Err(DeviceError::not_supported(format!(
                "Unsupported encoding: {}",
                other
            ))),
        }
    }
}

/// An opened input device. Clones share track state.
#[derive(Clone)]
pub struct CpalInputStream {
    device: Arc<Mutex<Device>>,
    config: StreamConfig,
    device_name: String,
    live: Arc<AtomicBool>,
}

impl CpalInputStream {
    fn open(selected: Option<&str>) -> Result<Self, DeviceError> {
        let host = cpal::default_host();

        let device = match selected {
            Some(wanted) => find_device(&host, wanted)?,
            None => host
                .default_input_device()
                .ok_or_else(|| DeviceError::not_found("No microphone found"))?,
        };

        let config = device
            .default_input_config()
            .map_err(|e| DeviceError::other(format!("Failed to get config: {}", e)))?;

        let device_name = device_name(&device);

        info!(
            device = %device_name,
            sample_rate = config.sample_rate(),
            channels = config.channels(),
            "Input stream opened"
        );

        Ok(Self {
            device: Arc::new(Mutex::new(device)),
            config: config.into(),
            device_name,
            live: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Human-readable device name.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Sample rate of the device in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    pub(crate) fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub(crate) fn device(&self) -> MutexGuard<'_, Device> {
        self.device.lock().unwrap_or_else(|e| {
            error!("Device lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }

    /// Mark the track as ended after a device failure.
    pub(crate) fn mark_ended(&self) {
        if self.live.swap(false, Ordering::AcqRel) {
            warn!(device = %self.device_name, "Input track ended");
        }
    }
}

impl AudioStream for CpalInputStream {
    fn is_active(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn has_live_audio_track(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn stop_tracks(&self) {
        if self.live.swap(false, Ordering::AcqRel) {
            debug!(device = %self.device_name, "Input tracks stopped");
        }
    }
}

/// Find an input device by enumeration index or exact name.
fn find_device(host: &Host, wanted: &str) -> Result<Device, DeviceError> {
    let mut devices = host
        .input_devices()
        .map_err(|e| DeviceError::other(format!("Failed to enumerate devices: {}", e)))?;

    if let Ok(index) = wanted.parse::<usize>() {
        return devices.nth(index).ok_or_else(|| {
            DeviceError::not_found(format!("Device index {} is out of range", index))
        });
    }

    devices
        .find(|d| device_name(d) == wanted)
        .ok_or_else(|| DeviceError::not_found(format!("Input device '{}' not found", wanted)))
}

#[allow(deprecated)]
fn device_name(device: &Device) -> String {
    device
        .name()
        .unwrap_or_else(|_| "Unknown device".to_string())
}
