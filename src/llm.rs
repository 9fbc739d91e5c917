//! Reasoning model client for OpenAI-compatible chat-completions APIs.
//!
//! One implementation covers every configured provider: Gemini (through
//! Google's OpenAI-compatible endpoint), OpenAI, and Ollama. Requests are
//! non-streaming, advertise the portfolio tools as `function` tools, and
//! retry 429/5xx with the same backoff as the embedding providers.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use folio_core::models::{Message, Role, ToolCall};
use folio_core::router::ReasoningModel;
use folio_core::tools::ToolDescriptor;

use crate::config::ModelConfig;
use crate::embedding::post_json_with_retry;

pub struct ChatCompletionsModel {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_retries: u32,
    provider: String,
}

impl ChatCompletionsModel {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url()),
            model: config.model_name().to_string(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
            provider: config.provider.clone(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    fn build_body(&self, messages: &[Message], tools: &[ToolDescriptor]) -> Value {
        let api_messages: Vec<Value> = messages.iter().map(message_to_api).collect();

        let mut body = json!({
            "model": self.model,
            "messages": api_messages,
            "temperature": self.temperature,
            "stream": false,
        });

        if !tools.is_empty() {
            let api_tools: Vec<Value> = tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = json!(api_tools);
        }

        body
    }
}

#[async_trait]
impl ReasoningModel for ChatCompletionsModel {
    async fn complete(&self, messages: &[Message], tools: &[ToolDescriptor]) -> Result<Message> {
        let body = self.build_body(messages, tools);
        let json = post_json_with_retry(
            &self.client,
            &self.endpoint,
            self.api_key.as_deref(),
            &body,
            self.max_retries,
            &self.provider,
        )
        .await
        .with_context(|| format!("chat completion failed (model {})", self.model))?;
        parse_completion(&json)
    }
}

fn message_to_api(msg: &Message) -> Value {
    match msg.role {
        Role::System => json!({ "role": "system", "content": msg.content }),
        Role::User => json!({ "role": "user", "content": msg.content }),
        Role::Assistant => {
            let mut result = json!({ "role": "assistant", "content": msg.content });
            if msg.has_tool_calls() {
                let calls: Vec<Value> = msg
                    .tool_calls
                    .iter()
                    .map(|c| {
                        json!({
                            "id": c.id,
                            "type": "function",
                            "function": {
                                "name": c.name,
                                "arguments": c.arguments.to_string(),
                            }
                        })
                    })
                    .collect();
                result["tool_calls"] = json!(calls);
            }
            result
        }
        Role::Tool => json!({
            "role": "tool",
            "tool_call_id": msg.tool_call_id.clone().unwrap_or_default(),
            "content": msg.content,
        }),
    }
}

/// Turn `choices[0].message` into an assistant [`Message`].
///
/// Tool-call arguments arrive as a JSON string. Unparseable arguments are
/// kept as a JSON string value so the tool router can reject them. Calls
/// without an id get a generated one.
fn parse_completion(json: &Value) -> Result<Message> {
    let message = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .ok_or_else(|| anyhow::anyhow!("Invalid chat completion: missing choices[0].message"))?;

    let content = message
        .get("content")
        .and_then(|c| c.as_str())
        .unwrap_or_default()
        .to_string();

    let mut calls = Vec::new();
    if let Some(raw_calls) = message.get("tool_calls").and_then(|t| t.as_array()) {
        for raw in raw_calls {
            let function = raw
                .get("function")
                .ok_or_else(|| anyhow::anyhow!("Invalid tool call: missing function"))?;
            let name = function
                .get("name")
                .and_then(|n| n.as_str())
                .ok_or_else(|| anyhow::anyhow!("Invalid tool call: missing function name"))?;

            let arguments = match function.get("arguments") {
                Some(Value::String(s)) if s.trim().is_empty() => json!({}),
                Some(Value::String(s)) => {
                    serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.clone()))
                }
                Some(other) => other.clone(),
                None => json!({}),
            };

            let id = raw
                .get("id")
                .and_then(|i| i.as_str())
                .filter(|i| !i.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple()));

            calls.push(ToolCall {
                id,
                name: name.to_string(),
                arguments,
            });
        }
    }

    if calls.is_empty() {
        Ok(Message::assistant(content))
    } else {
        Ok(Message::assistant_tool_calls(content, calls))
    }
}
