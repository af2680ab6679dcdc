//! Post-capture quality checks and gain normalization.

use thiserror::Error;

pub const MIN_DURATION_SECS: f32 = 0.5;
pub const MIN_RMS: f32 = 0.01;
pub const CLIP_THRESHOLD: f32 = 0.99;
pub const NORMALIZED_PEAK: f32 = 0.95;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioValidationError {
    #[error("Empty recording - no audio captured")]
    Empty,
    #[error("Recording too short: {duration:.2}s (min: {min}s)")]
    TooShort { duration: f32, min: f32 },
    #[error("Audio too quiet (RMS: {rms:.4}). No speech detected.")]
    TooQuiet { rms: f32 },
    #[error("Audio contains invalid values (NaN or Inf)")]
    NonFinite,
}

/// Measurements of a recording that passed validation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioStats {
    pub duration_secs: f32,
    pub rms: f32,
    pub peak: f32,
    pub clipped: bool,
}

pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / samples.len() as f64).sqrt() as f32
}

pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |max, &s| max.max(s.abs()))
}

/// Reject empty, short, silent or corrupt audio. Clipping only warns.
pub fn validate(samples: &[f32], sample_rate: u32) -> Result<AudioStats, AudioValidationError> {
    if samples.is_empty() {
        return Err(AudioValidationError::Empty);
    }

    let duration_secs = samples.len() as f32 / sample_rate as f32;
    if duration_secs < MIN_DURATION_SECS {
        return Err(AudioValidationError::TooShort {
            duration: duration_secs,
            min: MIN_DURATION_SECS,
        });
    }

    if samples.iter().any(|s| !s.is_finite()) {
        return Err(AudioValidationError::NonFinite);
    }

    let rms = rms(samples);
    if rms < MIN_RMS {
        return Err(AudioValidationError::TooQuiet { rms });
    }

    let peak = peak(samples);
    let clipped = peak >= CLIP_THRESHOLD;
    if clipped {
        log::warn!("⚠️ Audio may be clipped (max: {:.3})", peak);
    }

    Ok(AudioStats {
        duration_secs,
        rms,
        peak,
        clipped,
    })
}

/// Scale so the loudest sample sits at [`NORMALIZED_PEAK`]
pub fn normalize(samples: &mut [f32]) {
    let peak = peak(samples);
    if peak > 0.0 {
        let gain = NORMALIZED_PEAK / peak;
        samples.iter_mut().for_each(|s| *s *= gain);
    }
}
