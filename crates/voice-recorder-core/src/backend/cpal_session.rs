use crate::{
    backend::{CpalInputStream, WAV_MIME_TYPE},
    capture::{AudioStream, CaptureSession, DeviceError, SessionHandlers, SessionState},
};

use std::{
    collections::VecDeque,
    io::Cursor,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use cpal::{
    Stream, StreamError,
    traits::{DeviceTrait, StreamTrait},
};
use tracing::{debug, error, info, instrument, warn};

/// Maximum mono samples kept per session (10 minutes at 48kHz).
///
/// **Memory footprint at max capacity:**
/// - 48,000 Hz * 60s * 10 min * 4 bytes/f32 = ~115MB
pub(crate) const MAX_SESSION_SAMPLES: usize = 48_000 * 60 * 10;

/// A capture session on a [`CpalInputStream`] producing 16-bit mono WAV.
///
/// The WAV container needs the total length up front, so the recording is
/// delivered as a single chunk when the session stops, whether or not a
/// timeslice was requested.
pub struct CpalCaptureSession {
    input: CpalInputStream,
    state: Arc<Mutex<SessionState>>,
    samples: Arc<Mutex<VecDeque<f32>>>,
    handlers: Arc<Mutex<Option<SessionHandlers>>>,
    stream: Mutex<Option<Stream>>,
    /// Tells the audio callback to stop writing before the stream is dropped.
    shutdown: Arc<AtomicBool>,
}

impl CpalCaptureSession {
    pub(crate) fn new(input: CpalInputStream) -> Self {
        Self {
            input,
            state: Arc::new(Mutex::new(SessionState::Inactive)),
            samples: Arc::new(Mutex::new(VecDeque::new())),
            handlers: Arc::new(Mutex::new(None)),
            stream: Mutex::new(None),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    fn set_state(&self, state: SessionState) {
        *lock(&self.state) = state;
    }

    fn build_stream(&self) -> Result<Stream, DeviceError> {
        let samples = Arc::clone(&self.samples);
        let shutdown = Arc::clone(&self.shutdown);
        let channels = usize::from(self.input.config().channels.max(1));

        let handlers = Arc::clone(&self.handlers);
        let input = self.input.clone();

        self.input
            .device()
            .build_input_stream(
                self.input.config(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if shutdown.load(Ordering::Acquire) {
                        return;
                    }
                    let mut buf = lock(&samples);
                    append_mono(&mut buf, data, channels);
                },
                move |err| {
                    if !is_fatal(&err) {
                        warn!(error = %err, "Audio stream error, capture continues");
                        return;
                    }

                    error!(error = %err, "Audio input device lost");
                    input.mark_ended();

                    let on_error = lock(&handlers).as_ref().map(|h| Arc::clone(&h.on_error));
                    if let Some(on_error) = on_error {
                        // The handler stops the session, which drops this
                        // stream; that cannot happen on the stream's own thread.
                        let message = err.to_string();
                        std::thread::spawn(move || on_error(DeviceError::not_found(message)));
                    }
                },
                None,
            )
            .map_err(|e| DeviceError::other(format!("Failed to build stream: {}", e)))
    }
}

impl CaptureSession for CpalCaptureSession {
    fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    fn mime_type(&self) -> String {
        WAV_MIME_TYPE.to_string()
    }

    fn set_handlers(&self, handlers: SessionHandlers) {
        *lock(&self.handlers) = Some(handlers);
    }

    #[instrument(skip(self))]
    fn start(&self, timeslice: Option<Duration>) -> Result<(), DeviceError> {
        let state = self.state();
        if state != SessionState::Inactive {
            return Err(DeviceError::invalid_state(format!(
                "Cannot start a session in '{}' state",
                state
            )));
        }
        if !self.input.is_live() {
            return Err(DeviceError::invalid_state("Input stream has ended"));
        }
        if let Some(timeslice) = timeslice {
            debug!(
                timeslice_ms = timeslice.as_millis(),
                "WAV output is flushed once at stop"
            );
        }

        self.shutdown.store(false, Ordering::Release);
        lock(&self.samples).clear();

        let stream = self.build_stream()?;
        stream
            .play()
            .map_err(|e| DeviceError::other(format!("Failed to start stream: {}", e)))?;

        *lock(&self.stream) = Some(stream);
        self.set_state(SessionState::Recording);

        info!(device = %self.input.device_name(), "Audio capture started");

        Ok(())
    }

    fn pause(&self) -> Result<(), DeviceError> {
        if self.state() != SessionState::Recording {
            return Err(DeviceError::invalid_state("Session is not recording"));
        }

        if let Some(stream) = lock(&self.stream).as_ref() {
            stream
                .pause()
                .map_err(|e| DeviceError::other(format!("Failed to pause stream: {}", e)))?;
        }
        self.set_state(SessionState::Paused);

        Ok(())
    }

    fn resume(&self) -> Result<(), DeviceError> {
        if self.state() != SessionState::Paused {
            return Err(DeviceError::invalid_state("Session is not paused"));
        }

        if let Some(stream) = lock(&self.stream).as_ref() {
            stream
                .play()
                .map_err(|e| DeviceError::other(format!("Failed to resume stream: {}", e)))?;
        }
        self.set_state(SessionState::Recording);

        Ok(())
    }

    #[instrument(skip(self))]
    fn stop(&self) -> Result<(), DeviceError> {
        if !self.state().is_active() {
            return Err(DeviceError::invalid_state("Session is not recording"));
        }

        self.shutdown.store(true, Ordering::Release);
        if let Some(stream) = lock(&self.stream).take() {
            drop(stream);
        }
        self.set_state(SessionState::Inactive);

        let samples = Vec::from(std::mem::take(&mut *lock(&self.samples)));
        let sample_rate = self.input.sample_rate();
        let handlers = lock(&self.handlers).clone();

        info!(
            sample_count = samples.len(),
            duration_secs = samples.len() as f32 / sample_rate as f32,
            "Audio capture stopped"
        );

        let Some(handlers) = handlers else {
            warn!("Session stopped with no handlers registered");
            return Ok(());
        };

        if !samples.is_empty() {
            match encode_wav(&samples, sample_rate) {
                Ok(bytes) => (handlers.on_data)(bytes),
                Err(e) => (handlers.on_error)(DeviceError::other(format!(
                    "Failed to encode WAV: {}",
                    e
                ))),
            }
        }
        (handlers.on_stop)();

        Ok(())
    }
}

/// Only a vanished device ends the session. Overruns and backend hiccups
/// are reported by some hosts on every glitch while the stream keeps running.
pub(crate) fn is_fatal(err: &StreamError) -> bool {
    matches!(err, StreamError::DeviceNotAvailable)
}

/// Down-mix interleaved frames to mono and append, dropping the oldest
/// samples beyond [`MAX_SESSION_SAMPLES`].
pub(crate) fn append_mono(buf: &mut VecDeque<f32>, data: &[f32], channels: usize) {
    if channels <= 1 {
        buf.extend(data.iter().copied());
    } else {
        buf.extend(
            data.chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32),
        );
    }

    // Ring buffer: O(1) amortized drop of the oldest samples.
    while buf.len() > MAX_SESSION_SAMPLES {
        buf.pop_front();
    }
}

/// Encode mono samples as 16-bit PCM WAV.
pub(crate) fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample((sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Recover from lock poison rather than silently dropping audio.
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
