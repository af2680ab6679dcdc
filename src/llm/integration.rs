use super::client::{ChatClient, ChatProfile, LLMError, Message, OpenAiChatClient};
use super::context::Conversation;
use super::prompts::{truncate, ConversationTemplates, SystemPrompts};
use super::tools::{create_dns_registry, DnsTools, ToolError, ToolRegistry};
use crate::config::{DnsApiConfig, EndpointConfig};
use crate::dns::DnsClient;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Tool-use rounds allowed per user turn
pub const MAX_TOOL_ROUNDS: usize = 3;

#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("LLM error: {0}")]
    LLM(#[from] LLMError),
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),
    #[error("Empty input")]
    EmptyInput,
}

/// One tool call made during a turn and what it returned
#[derive(Debug, Clone, PartialEq)]
pub struct ToolExecution {
    pub name: String,
    pub arguments: Value,
    pub result: Value,
}

impl ToolExecution {
    pub fn succeeded(&self) -> bool {
        self.result.get("success").and_then(Value::as_bool) != Some(false)
    }

    /// `🔧 name(arg=value, ...)` with long values shortened
    pub fn call_line(&self) -> String {
        let args = match &self.arguments {
            Value::Object(map) => map
                .iter()
                .map(|(key, value)| {
                    let value = match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    format!("{}={}", key, truncate(&value, 15))
                })
                .collect::<Vec<_>>()
                .join(", "),
            Value::Null => String::new(),
            other => truncate(&other.to_string(), 15),
        };
        format!("🔧 {}({})", self.name, args)
    }

    /// `✅ message` or `❌ error`
    pub fn outcome_line(&self) -> String {
        if self.succeeded() {
            let message = self.result["message"].as_str().unwrap_or("Done");
            format!("✅ {}", truncate(message, 60))
        } else {
            let error = self.result["error"].as_str().unwrap_or("Failed");
            format!("❌ {}", truncate(error, 50))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// No tools ran; the model's reply is the answer
    Answer(String),
    /// Tools ran and the model wrapped them up
    Summary(String),
    /// Tools ran but the wrap-up request failed
    SummaryUnavailable(String),
    /// The model kept requesting tools until the cap
    RoundCapReached { rounds: usize },
}

impl TurnOutcome {
    /// Line shown to the user for this outcome
    pub fn display(&self) -> String {
        match self {
            TurnOutcome::Answer(text) => text.clone(),
            TurnOutcome::Summary(text) => format!("✨ {}", text),
            TurnOutcome::SummaryUnavailable(error) => format!("⚠️ Summary error: {}", error),
            TurnOutcome::RoundCapReached { rounds } => {
                ConversationTemplates::round_cap_reached(*rounds)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    pub outcome: TurnOutcome,
    pub executions: Vec<ToolExecution>,
    pub rounds: usize,
}

impl TurnReport {
    /// Console lines for the turn: each tool call and its result, then the outcome
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.executions.len() * 2 + 1);
        for execution in &self.executions {
            lines.push(execution.call_line());
            lines.push(format!("   {}", execution.outcome_line()));
        }
        let outcome = self.outcome.display();
        if !outcome.is_empty() {
            lines.push(outcome);
        }
        lines
    }
}

/// Drives the model through bounded tool-calling rounds for each user turn.
///
/// Owns the conversation log. Tool failures become `{success:false}` results
/// fed back to the model; model failures abort the turn and roll back the
/// unanswered user message.
pub struct AgentLoop {
    llm: Arc<dyn ChatClient>,
    registry: ToolRegistry,
    conversation: Conversation,
    max_rounds: usize,
}

impl AgentLoop {
    pub fn new(llm: Arc<dyn ChatClient>, registry: ToolRegistry) -> Self {
        Self {
            llm,
            registry,
            conversation: Conversation::new(SystemPrompts::dns_assistant()),
            max_rounds: MAX_TOOL_ROUNDS,
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run one user turn to completion
    pub async fn process_turn(&mut self, user_input: &str) -> Result<TurnReport, IntegrationError> {
        let user_input = user_input.trim();
        if user_input.is_empty() {
            return Err(IntegrationError::EmptyInput);
        }

        self.conversation.add_user_message(user_input);

        match self.run_rounds().await {
            Ok(report) => Ok(report),
            Err(e) => {
                log::error!("❌ Turn failed: {}", e);
                if self.conversation.pop_unanswered_user().is_some() {
                    log::debug!("Removed unanswered user message from context");
                }
                Err(e)
            }
        }
    }

    async fn run_rounds(&mut self) -> Result<TurnReport, IntegrationError> {
        let tools = self.registry.get_tool_definitions();
        let profile = ChatProfile::tool_calling();
        let mut executions = Vec::new();
        let mut rounds = 0;

        while rounds < self.max_rounds {
            let started = Instant::now();
            let response = self
                .llm
                .chat(self.conversation.messages(), &tools, &profile)
                .await?;
            log::debug!(
                "Round {} completion in {:.1}s ({} tool calls)",
                rounds + 1,
                started.elapsed().as_secs_f32(),
                response.tool_calls.len()
            );

            if response.tool_calls.is_empty() {
                let outcome = if rounds == 0 {
                    self.conversation.add_assistant_message(response.content.as_str());
                    TurnOutcome::Answer(response.content)
                } else {
                    self.summarize().await
                };

                return Ok(TurnReport {
                    outcome,
                    executions,
                    rounds,
                });
            }

            self.conversation.push(Message::assistant_with_tools(
                response.content.as_str(),
                response.tool_calls.clone(),
            ));

            for call in response.tool_calls {
                log::info!("🔧 Calling {} with {}", call.name, call.arguments);
                let result = match self
                    .registry
                    .execute_tool(&call.name, call.arguments.clone())
                    .await
                {
                    Ok(result) => result,
                    Err(e) => {
                        log::warn!("Tool {} failed: {}", call.name, e);
                        json!({ "success": false, "error": e.to_string() })
                    }
                };

                self.conversation
                    .push(Message::tool(call.id.as_str(), result.to_string()));
                executions.push(ToolExecution {
                    name: call.name,
                    arguments: call.arguments,
                    result,
                });
            }

            rounds += 1;
        }

        log::warn!("⚠️ Tool round cap of {} reached", self.max_rounds);
        Ok(TurnReport {
            outcome: TurnOutcome::RoundCapReached { rounds },
            executions,
            rounds,
        })
    }

    /// Ask for a short wrap-up without offering tools
    async fn summarize(&mut self) -> TurnOutcome {
        match self
            .llm
            .chat(self.conversation.messages(), &[], &ChatProfile::summary())
            .await
        {
            Ok(response) => {
                self.conversation.add_assistant_message(response.content.as_str());
                TurnOutcome::Summary(response.content)
            }
            Err(e) => {
                log::warn!("⚠️ Summary request failed: {}", e);
                TurnOutcome::SummaryUnavailable(e.to_string())
            }
        }
    }
}

/// Wire the configured chat endpoint and DNS server into an agent loop
pub fn build_agent(
    dns: DnsApiConfig,
    llm: &EndpointConfig,
) -> crate::Result<(AgentLoop, Arc<OpenAiChatClient>)> {
    let llm = Arc::new(OpenAiChatClient::new(llm)?);
    let dns = DnsClient::new(dns)?;
    let registry = create_dns_registry(Arc::new(DnsTools::new(dns)));
    Ok((AgentLoop::new(llm.clone(), registry), llm))
}
