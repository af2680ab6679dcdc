use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

pub mod dns;

pub use dns::{dns_tool_catalog, DnsToolCall, DnsTools};

/// Every tool exposed to the model, in catalog order
pub const DNS_TOOL_NAMES: [&str; 9] = [
    "add_dns_record",
    "get_dns_records",
    "find_domain_by_ip",
    "update_dns_record",
    "rename_dns_record",
    "delete_dns_record",
    "create_dns_zone",
    "list_dns_zones",
    "delete_dns_zone",
];

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),
    #[error("Tool execution failed: {0}")]
    ExecutionFailed(String),
    #[error("Invalid tool parameters: {0}")]
    InvalidParameters(String),
}

#[derive(Debug, Clone)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Runs a named tool and returns its JSON result
#[async_trait::async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, name: &str, arguments: Value) -> Result<Value, ToolError>;
}

pub struct ToolRegistry {
    tools: Vec<Tool>,
    executor: Arc<dyn ToolExecutor>,
}

impl ToolRegistry {
    pub fn new(executor: Arc<dyn ToolExecutor>) -> Self {
        Self {
            tools: Vec::new(),
            executor,
        }
    }

    /// Register a tool
    pub fn register_tool(&mut self, tool: Tool) {
        self.tools.push(tool);
    }

    /// Get available tools
    pub fn get_tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Find a tool by name
    pub fn find_tool(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    /// Execute a registered tool by name
    pub async fn execute_tool(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        if self.find_tool(name).is_none() {
            return Err(ToolError::NotFound(format!("Tool '{}' not found", name)));
        }

        self.executor.execute(name, arguments).await
    }

    /// Get tool definitions for LLM function calling
    pub fn get_tool_definitions(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|tool| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": {
                            "type": "object",
                            "properties": tool.parameters.get("properties").cloned().unwrap_or_else(|| serde_json::json!({})),
                            "required": tool.parameters.get("required").cloned().unwrap_or_else(|| serde_json::json!([])),
                        }
                    }
                })
            })
            .collect()
    }
}

/// Registry with the full DNS catalog backed by `executor`
pub fn create_dns_registry(executor: Arc<dyn ToolExecutor>) -> ToolRegistry {
    let mut registry = ToolRegistry::new(executor);
    for tool in dns_tool_catalog() {
        registry.register_tool(tool);
    }
    registry
}
