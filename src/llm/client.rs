use crate::config::EndpointConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretBox};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LLMError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Response parsing error: {0}")]
    ParseError(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Sampling settings sent with every completion request
#[derive(Debug, Clone, PartialEq)]
pub struct ChatProfile {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
}

impl ChatProfile {
    /// Deterministic, short output for choosing tool calls
    pub fn tool_calling() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: Some(40),
            top_p: Some(0.8),
            top_k: Some(5),
        }
    }

    /// One-line natural-language wrap-up after tools ran
    pub fn summary() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: Some(30),
            top_p: None,
            top_k: None,
        }
    }
}

impl Default for ChatProfile {
    fn default() -> Self {
        Self::tool_calling()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// A function call requested by the model
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub tool_call_id: Option<String>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Assistant turn that requested tool calls
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::new(Role::Assistant, content)
        }
    }

    /// Result of one tool call, linked back by id
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::new(Role::Tool, content)
        }
    }

    /// OpenAI chat-completions wire format
    pub fn to_json(&self) -> Value {
        let mut message = json!({
            "role": self.role.as_str(),
            "content": self.content,
        });

        if !self.tool_calls.is_empty() {
            message["tool_calls"] = self
                .tool_calls
                .iter()
                .map(|call| {
                    json!({
                        "id": call.id,
                        "type": "function",
                        "function": {
                            "name": call.name,
                            "arguments": call.arguments.to_string(),
                        }
                    })
                })
                .collect();
        }

        if let Some(id) = &self.tool_call_id {
            message["tool_call_id"] = json!(id);
        }

        message
    }
}

#[derive(Debug)]
pub struct LLMResponse {
    pub content: String,
    pub usage: Option<Usage>,
    pub model: String,
    pub finish_reason: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[async_trait::async_trait]
pub trait ChatClient: Send + Sync {
    /// One completion over the full conversation. `tools` may be empty.
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[Value],
        profile: &ChatProfile,
    ) -> Result<LLMResponse, LLMError>;
}

/// Client for any OpenAI-compatible chat endpoint (Ollama, vLLM, llama.cpp server)
pub struct OpenAiChatClient {
    client: Client,
    api_key: Option<SecretBox<String>>,
    base_url: String,
    model: String,
}

impl OpenAiChatClient {
    pub fn new(config: &EndpointConfig) -> Result<Self, LLMError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60)) // LLM calls can be slow
            .build()
            .map_err(|e| LLMError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config
                .api_key()
                .map(|key| SecretBox::new(Box::new(key.to_string()))),
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(
                "Authorization",
                format!("Bearer {}", key.expose_secret()),
            ),
            None => request,
        }
    }

    fn build_payload(&self, messages: &[Message], tools: &[Value], profile: &ChatProfile) -> Value {
        let messages_json: Vec<Value> = messages.iter().map(Message::to_json).collect();

        let mut payload = json!({
            "model": self.model,
            "messages": messages_json,
            "temperature": profile.temperature,
            "stream": false
        });

        if let Some(max_tokens) = profile.max_tokens {
            payload["max_tokens"] = json!(max_tokens);
        }
        if let Some(top_p) = profile.top_p {
            payload["top_p"] = json!(top_p);
        }
        if let Some(top_k) = profile.top_k {
            payload["top_k"] = json!(top_k);
        }

        // Add tools if provided
        if !tools.is_empty() {
            payload["tools"] = json!(tools);
            payload["tool_choice"] = json!("auto");
        }

        payload
    }

    /// Parse the JSON body of a chat completion
    fn parse_response(&self, response_text: &str) -> Result<LLMResponse, LLMError> {
        let json: Value = serde_json::from_str(response_text)
            .map_err(|e| LLMError::ParseError(format!("Invalid JSON: {}", e)))?;

        let choices = json["choices"]
            .as_array()
            .ok_or_else(|| LLMError::ParseError("Missing 'choices' field".to_string()))?;

        let first_choice = choices
            .first()
            .ok_or_else(|| LLMError::ParseError("Empty choices array".to_string()))?;
        let message = &first_choice["message"];

        let content = message["content"]
            .as_str()
            .unwrap_or("") // Content can be null when tool calls are made
            .to_string();

        let finish_reason = first_choice["finish_reason"].as_str().map(|s| s.to_string());

        let model = json["model"].as_str().unwrap_or(&self.model).to_string();

        let usage = json.get("usage").map(|usage_json| Usage {
            prompt_tokens: usage_json["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            completion_tokens: usage_json["completion_tokens"].as_u64().unwrap_or(0) as u32,
            total_tokens: usage_json["total_tokens"].as_u64().unwrap_or(0) as u32,
        });

        let tool_calls = match message.get("tool_calls").and_then(Value::as_array) {
            Some(calls) => calls
                .iter()
                .enumerate()
                .map(|(index, call)| parse_tool_call(index, call))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        Ok(LLMResponse {
            content,
            usage,
            model,
            finish_reason,
            tool_calls,
        })
    }

    /// Get available models
    pub async fn list_models(&self) -> Result<Vec<String>, LLMError> {
        let url = format!("{}/models", self.base_url);

        let response = self.authorized(self.client.get(&url)).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LLMError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let response_text = response.text().await?;
        let json: Value = serde_json::from_str(&response_text)
            .map_err(|e| LLMError::ParseError(format!("Invalid JSON: {}", e)))?;

        let models = json["data"]
            .as_array()
            .ok_or_else(|| LLMError::ParseError("Missing 'data' field".to_string()))?
            .iter()
            .filter_map(|model| model["id"].as_str().map(|s| s.to_string()))
            .collect();

        Ok(models)
    }
}

/// Arguments arrive either as a JSON object or as a JSON-encoded string
fn parse_tool_call(index: usize, call: &Value) -> Result<ToolCall, LLMError> {
    let function = &call["function"];
    let name = function["name"]
        .as_str()
        .ok_or_else(|| LLMError::ParseError("Tool call without a function name".to_string()))?;

    let arguments = match &function["arguments"] {
        Value::String(raw) if raw.trim().is_empty() => json!({}),
        Value::String(raw) => serde_json::from_str(raw).map_err(|e| {
            LLMError::ParseError(format!("Invalid tool call arguments: {}", e))
        })?,
        Value::Null => json!({}),
        other => other.clone(),
    };

    let id = call["id"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| format!("call_{}", index));

    Ok(ToolCall {
        id,
        name: name.to_string(),
        arguments,
    })
}

#[async_trait::async_trait]
impl ChatClient for OpenAiChatClient {
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[Value],
        profile: &ChatProfile,
    ) -> Result<LLMResponse, LLMError> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = self.build_payload(messages, tools, profile);

        log::debug!(
            "Chat request: {} messages, {} tools, max_tokens={:?}",
            messages.len(),
            tools.len(),
            profile.max_tokens
        );

        let response = self
            .authorized(self.client.post(&url))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LLMError::ApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let response_text = response.text().await?;
        self.parse_response(&response_text)
    }
}
