use secrecy::{ExposeSecret, SecretBox};
use std::env;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_DNS_URL: &str = "http://localhost:5380";
pub const DEFAULT_LLM_URL: &str = "http://localhost:11434/v1";
pub const DEFAULT_LLM_MODEL: &str = "qwen2.5:7b-instruct-q4_0";
pub const DEFAULT_STT_URL: &str = "http://localhost:8000/v1";
pub const DEFAULT_STT_MODEL: &str = "Systran/faster-whisper-small.en";

/// Per-call budget for the DNS management API.
pub const DNS_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

/// Connection settings for the DNS management API
#[derive(Debug)]
pub struct DnsApiConfig {
    pub base_url: Url,
    pub token: SecretBox<String>,
    pub timeout: Duration,
}

impl DnsApiConfig {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, ConfigError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                var: "DNS_API_TOKEN".to_string(),
                reason: "token cannot be empty".to_string(),
            });
        }

        Ok(Self {
            base_url: parse_url("DNS_SERVER_URL", base_url)?,
            token: SecretBox::new(Box::new(token)),
            timeout: DNS_REQUEST_TIMEOUT,
        })
    }

    /// Get the API token (use only when making API calls)
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }

    /// Base URL without a trailing slash, as shown in error messages
    pub fn server_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Full URL for an API path such as `zones/records/add`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.server_url(), path)
    }
}

/// Settings for an OpenAI-compatible HTTP endpoint (chat or transcription)
#[derive(Debug)]
pub struct EndpointConfig {
    pub base_url: Url,
    pub model: String,
    pub api_key: Option<SecretBox<String>>,
}

impl EndpointConfig {
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|key| key.expose_secret().as_str())
    }

    /// Full URL for a path relative to the base, e.g. `chat/completions`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }
}

/// Complete application configuration, built once at startup
#[derive(Debug)]
pub struct AppConfig {
    pub dns: DnsApiConfig,
    pub llm: EndpointConfig,
    pub stt: EndpointConfig,
}

impl AppConfig {
    /// Load configuration from environment variables (and `.env` if present)
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (for development)
        dotenvy::dotenv().ok();

        let token = env::var("DNS_API_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("DNS_API_TOKEN".to_string()))?;
        let dns = DnsApiConfig::new(&var_or("DNS_SERVER_URL", DEFAULT_DNS_URL), token)?;

        let llm = EndpointConfig {
            base_url: parse_url("LLM_BASE_URL", &var_or("LLM_BASE_URL", DEFAULT_LLM_URL))?,
            model: var_or("LLM_MODEL", DEFAULT_LLM_MODEL),
            api_key: optional_secret("LLM_API_KEY"),
        };

        let stt = EndpointConfig {
            base_url: parse_url("STT_BASE_URL", &var_or("STT_BASE_URL", DEFAULT_STT_URL))?,
            model: var_or("STT_MODEL", DEFAULT_STT_MODEL),
            api_key: optional_secret("STT_API_KEY"),
        };

        Ok(Self { dns, llm, stt })
    }
}

fn var_or(var: &str, default: &str) -> String {
    env::var(var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn optional_secret(var: &str) -> Option<SecretBox<String>> {
    env::var(var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(|value| SecretBox::new(Box::new(value)))
}

fn parse_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidValue {
        var: var.to_string(),
        reason: format!("'{}' is not a valid URL: {}", raw, e),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidValue {
            var: var.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

/// Load configuration with helpful error messages for development
pub fn load_config() -> Result<AppConfig, ConfigError> {
    match AppConfig::load() {
        Ok(config) => {
            log::info!(
                "Loaded configuration (DNS server: {}, model: {})",
                config.dns.server_url(),
                config.llm.model
            );
            Ok(config)
        }
        Err(ConfigError::MissingEnvVar(var)) => {
            log::error!("Missing required environment variable: {}", var);
            log::error!("Create a .env file in the project root with:");
            log::error!("{}=your_token_here", var);
            Err(ConfigError::MissingEnvVar(var))
        }
        Err(e) => {
            log::error!("Configuration error: {}", e);
            Err(e)
        }
    }
}
