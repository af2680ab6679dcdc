use thiserror::Error;

pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("DNS API error: {0}")]
    DnsApi(#[from] crate::dns::DnsApiError),

    #[error("LLM error: {0}")]
    LLM(#[from] crate::llm::LLMError),

    #[error("Agent turn failed: {0}")]
    Integration(#[from] crate::llm::IntegrationError),

    #[error("Recording error: {0}")]
    Recording(#[from] crate::audio::RecordingError),

    #[error("STT error: {0}")]
    STT(#[from] crate::stt::STTError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
