//! Google Gemini adapter.
//!
//! Implements the Gemini `generateContent` API.
//! Auth is via an API key passed as a query parameter (`key={api_key}`).

use std::time::{Duration, Instant};

use serde_json::Value;
use wh_domain::config::{LlmConfig, ProviderConfig};
use wh_domain::error::{Error, Result};
use wh_domain::tool::{Message, ToolCall, ToolDefinition};
use wh_domain::trace::TraceEvent;
use wh_domain::usage::Usage;

use crate::traits::{ChatRequest, ChatResponse, LlmProvider};
use crate::util::{from_reqwest, redact_url_key, resolve_api_key};

/// Model used when neither the request nor the config names one.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// An LLM provider adapter for the Google Gemini API.
pub struct GoogleProvider {
    id: String,
    base_url: String,
    api_key: String,
    default_model: String,
    client: reqwest::Client,
}

impl GoogleProvider {
    /// Create a new provider from the deserialized provider config.
    pub fn from_config(cfg: &ProviderConfig, timeout: Duration) -> Result<Self> {
        let api_key = resolve_api_key(&cfg.auth)?;
        let default_model = cfg
            .default_model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.into());

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            id: cfg.id.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            default_model,
            client,
        })
    }

    /// Convenience constructor from the whole `[llm]` section.
    pub fn from_llm_config(cfg: &LlmConfig) -> Result<Self> {
        Self::from_config(&cfg.provider, Duration::from_millis(cfg.timeout_ms))
    }

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        )
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request serialization
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn build_body(req: &ChatRequest) -> Value {
    let mut contents: Vec<Value> = Vec::new();

    for msg in &req.messages {
        match msg {
            Message::User { content } => {
                let part = serde_json::json!({ "text": content });
                // Roles must alternate; a user turn after another user
                // turn joins it.
                match contents.last_mut() {
                    Some(last) if last["role"] == "user" => {
                        if let Some(parts) = last["parts"].as_array_mut() {
                            parts.push(part);
                        }
                    }
                    _ => contents.push(serde_json::json!({
                        "role": "user",
                        "parts": [part],
                    })),
                }
            }
            Message::Assistant { content, tool_calls } => {
                contents.push(assistant_to_gemini(content, tool_calls));
            }
            Message::ToolResult {
                tool_name, content, ..
            } => {
                let part = serde_json::json!({
                    "functionResponse": {
                        "name": tool_name,
                        "response": { "content": content },
                    }
                });
                // Gemini expects every response to one model turn in a
                // single content block.
                match contents.last_mut() {
                    Some(last) if is_function_response_block(last) => {
                        if let Some(parts) = last["parts"].as_array_mut() {
                            parts.push(part);
                        }
                    }
                    _ => contents.push(serde_json::json!({
                        "role": "user",
                        "parts": [part],
                    })),
                }
            }
        }
    }

    let mut body = serde_json::json!({
        "contents": contents,
    });

    if let Some(system) = req.system.as_deref().filter(|s| !s.is_empty()) {
        body["systemInstruction"] = serde_json::json!({
            "parts": [{ "text": system }]
        });
    }

    if !req.tools.is_empty() {
        let function_declarations: Vec<Value> = req.tools.iter().map(tool_to_gemini).collect();
        body["tools"] = serde_json::json!([{
            "functionDeclarations": function_declarations,
        }]);
    }

    let mut gen_config = serde_json::json!({});
    if let Some(temp) = req.temperature {
        gen_config["temperature"] = serde_json::json!(temp);
    }
    if let Some(max) = req.max_tokens {
        gen_config["maxOutputTokens"] = serde_json::json!(max);
    }
    if gen_config.as_object().is_some_and(|o| !o.is_empty()) {
        body["generationConfig"] = gen_config;
    }

    body
}

fn is_function_response_block(content: &Value) -> bool {
    content["role"] == "user"
        && content["parts"]
            .as_array()
            .is_some_and(|parts| parts.iter().all(|p| p.get("functionResponse").is_some()))
}

fn assistant_to_gemini(content: &str, tool_calls: &[ToolCall]) -> Value {
    let mut parts: Vec<Value> = Vec::new();
    if !content.is_empty() {
        parts.push(serde_json::json!({ "text": content }));
    }
    for tc in tool_calls {
        parts.push(serde_json::json!({
            "functionCall": {
                "name": tc.tool_name,
                "args": tc.arguments,
            }
        }));
    }
    serde_json::json!({
        "role": "model",
        "parts": parts,
    })
}

fn tool_to_gemini(tool: &ToolDefinition) -> Value {
    serde_json::json!({
        "name": tool.name,
        "description": tool.description,
        "parameters": tool.parameters,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Response deserialization
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn parse_gemini_response(provider: &str, body: &Value, model: &str) -> Result<ChatResponse> {
    let candidate = body
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .ok_or_else(|| Error::Provider {
            provider: provider.into(),
            message: "no candidates in response".into(),
        })?;

    let parts = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array());

    let mut text_content = String::new();
    let mut tool_calls: Vec<ToolCall> = Vec::new();

    if let Some(parts) = parts {
        for part in parts {
            if let Some(text) = part.get("text").and_then(|v| v.as_str()) {
                text_content.push_str(text);
            }
            if let Some(fc) = part.get("functionCall") {
                let tool_name = fc
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string();
                let arguments = fc
                    .get("args")
                    .cloned()
                    .unwrap_or(Value::Object(Default::default()));
                // Gemini does not assign call ids; mint one per call.
                let call_id = format!("call_{}", uuid::Uuid::new_v4());
                tool_calls.push(ToolCall {
                    call_id,
                    tool_name,
                    arguments,
                });
            }
        }
    }

    let finish_reason = candidate
        .get("finishReason")
        .and_then(|v| v.as_str())
        .map(|s| match s {
            "STOP" => "stop".to_string(),
            "MAX_TOKENS" => "length".to_string(),
            other => other.to_lowercase(),
        });

    if text_content.is_empty() && tool_calls.is_empty() {
        return Err(Error::Provider {
            provider: provider.into(),
            message: format!(
                "empty candidate (finishReason: {})",
                finish_reason.as_deref().unwrap_or("unknown")
            ),
        });
    }

    let usage = body.get("usageMetadata").and_then(parse_gemini_usage);

    Ok(ChatResponse {
        content: text_content,
        tool_calls,
        usage,
        model: model.to_string(),
        finish_reason,
    })
}

fn parse_gemini_usage(v: &Value) -> Option<Usage> {
    let prompt = v.get("promptTokenCount")?.as_u64()? as u32;
    let completion = v
        .get("candidatesTokenCount")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;
    let total = v
        .get("totalTokenCount")
        .and_then(|v| v.as_u64())
        .unwrap_or((prompt + completion) as u64) as u32;
    Some(Usage {
        prompt_tokens: prompt,
        completion_tokens: completion,
        total_tokens: total,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl LlmProvider for GoogleProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        let model = req
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());
        let url = self.generate_url(&model);
        let body = build_body(req);

        tracing::debug!(provider = %self.id, url = %redact_url_key(&url), "google chat request");
        let started = Instant::now();

        let resp = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        let resp_text = resp.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            return Err(Error::Provider {
                provider: self.id.clone(),
                message: format!("HTTP {} - {}", status.as_u16(), resp_text),
            });
        }

        let resp_json: Value = serde_json::from_str(&resp_text)?;
        let response = parse_gemini_response(&self.id, &resp_json, &model)?;

        TraceEvent::LlmRequest {
            provider: self.id.clone(),
            model: model.clone(),
            duration_ms: started.elapsed().as_millis() as u64,
            prompt_tokens: response.usage.map(|u| u.prompt_tokens),
            completion_tokens: response.usage.map(|u| u.completion_tokens),
        }
        .emit();

        Ok(response)
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
