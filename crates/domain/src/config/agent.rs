use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Agent execution
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Execution-graph settings shared by every conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Conversation used by single-session callers (the chat REPL).
    #[serde(default = "d_conversation_id")]
    pub conversation_id: String,

    /// Maximum model turns per `invoke`/`resume` before the run is failed.
    /// `0` disables the limit.
    #[serde(default = "d_25")]
    pub max_steps: usize,

    /// Optional system instruction sent with every model request.
    /// Never stored in conversation history.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            conversation_id: d_conversation_id(),
            max_steps: 25,
            system_prompt: None,
        }
    }
}

fn d_conversation_id() -> String {
    "hello123".into()
}
fn d_25() -> usize {
    25
}
