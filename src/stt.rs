use crate::config::EndpointConfig;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretBox};
use serde::Deserialize;
use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum STTError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Audio format error: {0}")]
    AudioFormat(String),
    #[error("Response parsing error: {0}")]
    ParseError(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("No speech detected")]
    NoSpeechDetected,
}

/// Decoding settings for one batch transcription
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionProfile {
    pub language: String,
    pub vad_filter: bool,
    pub vad_threshold: f32,
    pub min_speech_duration_ms: u32,
    pub min_silence_duration_ms: u32,
    pub speech_pad_ms: u32,
    pub beam_size: u32,
    pub best_of: u32,
    pub patience: f32,
    pub temperature: f32,
    pub compression_ratio_threshold: f32,
    pub log_prob_threshold: f32,
    pub no_speech_threshold: f32,
    pub condition_on_previous_text: bool,
    pub word_timestamps: bool,
}

impl Default for TranscriptionProfile {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            vad_filter: true,
            vad_threshold: 0.5,
            min_speech_duration_ms: 250,
            min_silence_duration_ms: 2000,
            speech_pad_ms: 400,
            beam_size: 5,
            best_of: 5,
            patience: 1.0,
            temperature: 0.0,
            compression_ratio_threshold: 2.4,
            log_prob_threshold: -1.0,
            no_speech_threshold: 0.6,
            condition_on_previous_text: false,
            word_timestamps: false,
        }
    }
}

impl TranscriptionProfile {
    /// Form fields sent alongside the audio
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("language", self.language.clone()),
            ("vad_filter", self.vad_filter.to_string()),
            ("vad_threshold", self.vad_threshold.to_string()),
            ("min_speech_duration_ms", self.min_speech_duration_ms.to_string()),
            ("min_silence_duration_ms", self.min_silence_duration_ms.to_string()),
            ("speech_pad_ms", self.speech_pad_ms.to_string()),
            ("beam_size", self.beam_size.to_string()),
            ("best_of", self.best_of.to_string()),
            ("patience", self.patience.to_string()),
            ("temperature", self.temperature.to_string()),
            (
                "compression_ratio_threshold",
                self.compression_ratio_threshold.to_string(),
            ),
            ("log_prob_threshold", self.log_prob_threshold.to_string()),
            ("no_speech_threshold", self.no_speech_threshold.to_string()),
            (
                "condition_on_previous_text",
                self.condition_on_previous_text.to_string(),
            ),
            ("word_timestamps", self.word_timestamps.to_string()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Segment {
    pub start: f32,
    pub end: f32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TranscriptionInfo {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub language_probability: Option<f32>,
    #[serde(default)]
    pub duration: f32,
    #[serde(default)]
    pub duration_after_vad: Option<f32>,
}

/// Segments yielded in chronological order, consumed once
pub type Segments = Box<dyn Iterator<Item = Segment> + Send>;

/// A batch transcriber for 16 kHz-style mono float audio
#[async_trait::async_trait]
pub trait TranscriptionEngine: Send + Sync {
    async fn transcribe(
        &self,
        samples: &[f32],
        sample_rate: u32,
        profile: &TranscriptionProfile,
    ) -> Result<(Segments, TranscriptionInfo), STTError>;
}

/// Encode mono float samples as 16-bit PCM WAV bytes
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, STTError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| STTError::AudioFormat(e.to_string()))?;
        for &sample in samples {
            let pcm = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(pcm)
                .map_err(|e| STTError::AudioFormat(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| STTError::AudioFormat(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    #[serde(flatten)]
    info: TranscriptionInfo,
    #[serde(default)]
    segments: Vec<Segment>,
}

/// Engine backed by an OpenAI-compatible `/audio/transcriptions` endpoint
/// (faster-whisper-server, speaches, whisper.cpp server)
pub struct HttpTranscriptionEngine {
    client: Client,
    url: String,
    model: String,
    api_key: Option<SecretBox<String>>,
}

impl HttpTranscriptionEngine {
    pub fn new(config: &EndpointConfig) -> Result<Self, STTError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| STTError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.endpoint("audio/transcriptions"),
            model: config.model.clone(),
            api_key: config
                .api_key()
                .map(|key| SecretBox::new(Box::new(key.to_string()))),
        })
    }

    fn parse_response(body: &str) -> Result<(Segments, TranscriptionInfo), STTError> {
        let parsed: VerboseTranscription = serde_json::from_str(body)
            .map_err(|e| STTError::ParseError(format!("Invalid transcription JSON: {}", e)))?;
        Ok((Box::new(parsed.segments.into_iter()), parsed.info))
    }
}

#[async_trait::async_trait]
impl TranscriptionEngine for HttpTranscriptionEngine {
    async fn transcribe(
        &self,
        samples: &[f32],
        sample_rate: u32,
        profile: &TranscriptionProfile,
    ) -> Result<(Segments, TranscriptionInfo), STTError> {
        let wav = encode_wav(samples, sample_rate)?;
        log::debug!(
            "Sending {} bytes of WAV audio to {}",
            wav.len(),
            self.url
        );

        let file = Part::bytes(wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| STTError::AudioFormat(e.to_string()))?;

        let mut form = Form::new()
            .part("file", file)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");
        for (key, value) in profile.form_fields() {
            form = form.text(key, value);
        }

        let mut request = self.client.post(&self.url).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key.expose_secret()));
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(STTError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        Self::parse_response(&body)
    }
}

/// Final text for one utterance
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub info: TranscriptionInfo,
    pub segment_count: usize,
}

/// Runs an engine with a fixed profile and joins its segments into one string
pub struct Transcriber {
    engine: Arc<dyn TranscriptionEngine>,
    profile: TranscriptionProfile,
}

impl Transcriber {
    pub fn new(engine: Arc<dyn TranscriptionEngine>) -> Self {
        Self::with_profile(engine, TranscriptionProfile::default())
    }

    pub fn with_profile(engine: Arc<dyn TranscriptionEngine>, profile: TranscriptionProfile) -> Self {
        Self { engine, profile }
    }

    pub fn profile(&self) -> &TranscriptionProfile {
        &self.profile
    }

    pub async fn transcribe(&self, samples: &[f32], sample_rate: u32) -> Result<Transcript, STTError> {
        let started = Instant::now();
        let (segments, info) = self
            .engine
            .transcribe(samples, sample_rate, &self.profile)
            .await?;

        match info.language_probability {
            Some(probability) => log::info!(
                "Detected language '{}' with probability {:.2}",
                info.language,
                probability
            ),
            None => log::info!("Language: '{}'", info.language),
        }
        if let Some(after_vad) = info.duration_after_vad {
            log::debug!(
                "Audio duration {:.2}s, {:.2}s after VAD",
                info.duration,
                after_vad
            );
        }

        let mut parts = Vec::new();
        for segment in segments {
            let text = segment.text.trim();
            if text.is_empty() {
                continue;
            }
            log::info!("[{:.2}s -> {:.2}s] {}", segment.start, segment.end, text);
            parts.push(text.to_string());
        }

        if parts.is_empty() {
            log::warn!("⚠️ No speech detected");
            return Err(STTError::NoSpeechDetected);
        }

        log::info!(
            "📝 Transcribed {} segments in {:.1}s",
            parts.len(),
            started.elapsed().as_secs_f32()
        );

        Ok(Transcript {
            text: parts.join(" "),
            info,
            segment_count: parts.len(),
        })
    }
}
