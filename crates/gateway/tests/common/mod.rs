//! Shared fixtures: a scripted model and a state wired around it.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};

use wh_domain::config::Config;
use wh_domain::error::{Error, Result};
use wh_domain::tool::{ToolCall, ToolDefinition};
use wh_gateway::{AppState, Session};
use wh_providers::{ChatRequest, ChatResponse, LlmProvider};
use wh_tools::registry::parse_arguments;
use wh_tools::{ApprovalGate, Capability, CapabilityError, CapabilityRegistry};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Scripted provider
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub enum Step {
    Reply(ChatResponse),
    Fail(String),
    /// Reply after the given delay.
    Slow(std::time::Duration, ChatResponse),
}

/// Plays back canned responses in order and records every request.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn push(&self, step: Step) {
        self.script.lock().push_back(step);
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().push(req.clone());
        let step = self.script.lock().pop_front();
        match step {
            Some(Step::Reply(resp)) => Ok(resp),
            Some(Step::Slow(delay, resp)) => {
                tokio::time::sleep(delay).await;
                Ok(resp)
            }
            Some(Step::Fail(message)) => Err(Error::Provider {
                provider: "scripted".into(),
                message,
            }),
            None => Err(Error::Provider {
                provider: "scripted".into(),
                message: "script exhausted".into(),
            }),
        }
    }

    fn provider_id(&self) -> &str {
        "scripted"
    }
}

pub fn text(content: &str) -> Step {
    Step::Reply(reply(content))
}

/// A text reply that arrives after `millis`.
pub fn slow_text(millis: u64, content: &str) -> Step {
    Step::Slow(std::time::Duration::from_millis(millis), reply(content))
}

fn reply(content: &str) -> ChatResponse {
    ChatResponse {
        content: content.into(),
        tool_calls: Vec::new(),
        usage: None,
        model: "scripted".into(),
        finish_reason: Some("stop".into()),
    }
}

/// An assistant turn that only requests tools: `(call_id, tool, arguments)`.
pub fn calls(requested: &[(&str, &str, Value)]) -> Step {
    Step::Reply(ChatResponse {
        content: String::new(),
        tool_calls: requested
            .iter()
            .map(|(id, tool, args)| ToolCall {
                call_id: (*id).into(),
                tool_name: (*tool).into(),
                arguments: args.clone(),
            })
            .collect(),
        usage: None,
        model: "scripted".into(),
        finish_reason: Some("tool_calls".into()),
    })
}

pub fn weather(call_id: &'static str, city: &str) -> (&'static str, &'static str, Value) {
    (call_id, "get_weather", json!({ "city": city }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Echo capability (completes without approval)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EchoArgs {
    text: String,
}

pub struct Echo;

#[async_trait::async_trait]
impl Capability for Echo {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "echo".into(),
            description: "Repeat the given text".into(),
            parameters: json!({
                "type": "object",
                "properties": { "text": { "type": "string" } },
                "required": ["text"]
            }),
        }
    }

    async fn call(
        &self,
        arguments: Value,
        _gate: &mut ApprovalGate,
    ) -> std::result::Result<String, CapabilityError> {
        let args: EchoArgs = parse_arguments("echo", arguments)?;
        Ok(args.text)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// State
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub fn state_with(config: Config, provider: Arc<ScriptedProvider>) -> AppState {
    let mut tools: CapabilityRegistry = wh_tools::builtin_registry();
    tools.register(Arc::new(Echo));
    AppState::new(Arc::new(config), provider, tools)
}

pub fn session(steps: Vec<Step>) -> (Session, Arc<ScriptedProvider>) {
    let provider = ScriptedProvider::new(steps);
    let state = state_with(Config::default(), provider.clone());
    (Session::new(state), provider)
}

pub const CONV: &str = "hello123";
