pub mod capture;
pub mod validation;

pub use capture::{
    list_devices, AudioCaptureError, AudioDeviceInfo, AudioSource, BlockResampler,
    CpalAudioSource, Frame, FrameCallback,
};
pub use validation::{AudioStats, AudioValidationError};

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Capture rate expected by the transcription engine
pub const SAMPLE_RATE: u32 = 16_000;
pub const BLOCK_DURATION_MS: u32 = 100;
/// Samples per mono block at [`SAMPLE_RATE`]
pub const BLOCK_SIZE: usize = (SAMPLE_RATE * BLOCK_DURATION_MS / 1000) as usize;
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(10);
/// Pause between the stop condition and tearing the stream down
pub const STOP_GRACE: Duration = Duration::from_millis(200);

#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("No audio captured")]
    NoAudio,
    #[error("Failed to concatenate audio frames: {0}")]
    Concatenation(String),
    #[error("Invalid recording: {0}")]
    Invalid(#[from] AudioValidationError),
    #[error("Capture failed: {0}")]
    Capture(#[from] AudioCaptureError),
    #[error("Audio buffer lock poisoned")]
    BufferPoisoned,
}

/// Set-once stop flag shared between whoever ends a recording and the
/// recorder waiting on it. Setting it more than once is harmless.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        let (flag, cvar) = &*self.inner;
        let mut stopped = flag.lock().unwrap_or_else(|e| e.into_inner());
        *stopped = true;
        cvar.notify_all();
    }

    pub fn is_set(&self) -> bool {
        let (flag, _) = &*self.inner;
        *flag.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Block until set or until `timeout` elapses. Returns true if set.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (flag, cvar) = &*self.inner;
        let guard = flag.lock().unwrap_or_else(|e| e.into_inner());
        let (guard, _) = cvar
            .wait_timeout_while(guard, timeout, |stopped| !*stopped)
            .unwrap_or_else(|e| e.into_inner());
        *guard
    }
}

#[derive(Debug, Clone)]
pub struct RecorderConfig {
    pub max_duration: Duration,
    pub stop_grace: Duration,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            max_duration: DEFAULT_MAX_DURATION,
            stop_grace: STOP_GRACE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Manual,
    Timeout,
}

/// A validated, peak-normalized mono recording
#[derive(Debug, Clone)]
pub struct RecordedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub duration_secs: f32,
    /// Energy and peak measured before normalization
    pub rms: f32,
    pub peak: f32,
    pub clipped: bool,
    pub stop_reason: StopReason,
}

/// Flatten buffered frames into one mono waveform.
///
/// Every frame must share the first frame's channel count.
pub fn concatenate(frames: &[Frame]) -> Result<Vec<f32>, RecordingError> {
    let Some(first) = frames.first() else {
        return Err(RecordingError::NoAudio);
    };

    let channels = first.channels;
    if channels == 0 {
        return Err(RecordingError::Concatenation(
            "frame has zero channels".to_string(),
        ));
    }

    let mut samples = Vec::with_capacity(frames.iter().map(|f| f.samples.len()).sum());
    for (index, frame) in frames.iter().enumerate() {
        if frame.channels != channels {
            return Err(RecordingError::Concatenation(format!(
                "frame {} has {} channels, expected {}",
                index, frame.channels, channels
            )));
        }
        if frame.samples.len() % usize::from(channels) != 0 {
            return Err(RecordingError::Concatenation(format!(
                "frame {} length {} is not a multiple of {} channels",
                index,
                frame.samples.len(),
                channels
            )));
        }
        samples.extend(capture::downmix(&frame.samples, usize::from(channels)));
    }

    Ok(samples)
}

/// One-shot recording sessions over an [`AudioSource`].
///
/// The capture callback appends frames to a shared buffer until the stop
/// signal is set, either by a caller holding [`Recorder::stop_signal`] or by
/// the session timeout. The buffer is drained, validated and normalized once
/// the source has been stopped.
///
/// Each signal ends exactly one session: a signal set before `record` is
/// called stops that session at once, and the recorder switches to a fresh
/// signal for the next one.
pub struct Recorder<S: AudioSource> {
    source: S,
    config: RecorderConfig,
    buffer: Arc<Mutex<Vec<Frame>>>,
    stop: StopSignal,
}

impl<S: AudioSource> Recorder<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, RecorderConfig::default())
    }

    pub fn with_config(source: S, config: RecorderConfig) -> Self {
        Self {
            source,
            config,
            buffer: Arc::new(Mutex::new(Vec::new())),
            stop: StopSignal::new(),
        }
    }

    /// Share an existing signal, for callers that must hold it before the
    /// recorder exists (e.g. when the source is built on another thread)
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Handle for ending the next (or current) recording early
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Record until stopped or timed out, then validate and normalize.
    ///
    /// Blocks the calling thread for the whole session.
    pub fn record(&mut self) -> Result<RecordedAudio, RecordingError> {
        self.buffer
            .lock()
            .map_err(|_| RecordingError::BufferPoisoned)?
            .clear();
        let stop = std::mem::take(&mut self.stop);

        let buffer = Arc::clone(&self.buffer);
        let callback_stop = stop.clone();
        self.source.start(Box::new(move |frame| {
            if callback_stop.is_set() {
                return;
            }
            match buffer.lock() {
                Ok(mut frames) => frames.push(frame),
                Err(_) => log::error!("Audio buffer lock poisoned, dropping frame"),
            }
        }))?;

        log::info!(
            "🎙️ Recording (max {:.1}s)...",
            self.config.max_duration.as_secs_f32()
        );
        let started = Instant::now();

        let stop_reason = if stop.wait_timeout(self.config.max_duration) {
            StopReason::Manual
        } else {
            StopReason::Timeout
        };
        // The callback drops frames from here on
        stop.set();
        std::thread::sleep(self.config.stop_grace);
        self.source.stop();

        log::debug!(
            "Recording stopped ({:?}) after {:.2}s",
            stop_reason,
            started.elapsed().as_secs_f32()
        );

        let frames = std::mem::take(
            &mut *self
                .buffer
                .lock()
                .map_err(|_| RecordingError::BufferPoisoned)?,
        );
        if frames.is_empty() {
            return Err(RecordingError::NoAudio);
        }

        let mut samples = concatenate(&frames)?;
        let sample_rate = self.source.sample_rate();
        let stats = validation::validate(&samples, sample_rate)?;
        validation::normalize(&mut samples);

        log::info!(
            "✅ Captured {:.2}s of audio (RMS: {:.4}, peak: {:.3})",
            stats.duration_secs,
            stats.rms,
            stats.peak
        );

        Ok(RecordedAudio {
            samples,
            sample_rate,
            duration_secs: stats.duration_secs,
            rms: stats.rms,
            peak: stats.peak,
            clipped: stats.clipped,
            stop_reason,
        })
    }
}
