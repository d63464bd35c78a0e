use serde::Serialize;

/// Structured trace events emitted across all whisperer crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    ConversationCreated {
        conversation_id: String,
    },
    LlmRequest {
        provider: String,
        model: String,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
    StepCommitted {
        conversation_id: String,
        node: String,
        messages: usize,
    },
    /// A committed step was taken back because the step after it failed.
    StepWithdrawn {
        conversation_id: String,
        messages: usize,
    },
    ApprovalRequested {
        conversation_id: String,
        call_id: String,
        tool_name: String,
    },
    ApprovalResolved {
        conversation_id: String,
        call_id: String,
        tool_name: String,
        decision: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "wh_event");
    }
}
