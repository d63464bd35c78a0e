mod agent;
mod llm;
mod observability;
mod server;

pub use agent::*;
pub use llm::*;
pub use observability::*;
pub use server::*;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// A single finding from [`Config::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "[{level}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Check semantic constraints that serde cannot express.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.agent.conversation_id.trim().is_empty() {
            issues.push(ConfigIssue {
                severity: Severity::Error,
                field: "agent.conversation_id".into(),
                message: "must not be empty".into(),
            });
        }
        if self.llm.provider.base_url.trim().is_empty() {
            issues.push(ConfigIssue {
                severity: Severity::Error,
                field: "llm.provider.base_url".into(),
                message: "must not be empty".into(),
            });
        }
        if self.llm.provider.auth.key.is_none() && self.llm.provider.auth.env.is_none() {
            issues.push(ConfigIssue {
                severity: Severity::Error,
                field: "llm.provider.auth".into(),
                message: "set either `key` or `env`".into(),
            });
        }
        if self.llm.provider.auth.key.is_some() {
            issues.push(ConfigIssue {
                severity: Severity::Warning,
                field: "llm.provider.auth.key".into(),
                message: "plaintext API key in config; prefer `env`".into(),
            });
        }
        if let Some(t) = self.llm.temperature {
            if !(0.0..=2.0).contains(&t) {
                issues.push(ConfigIssue {
                    severity: Severity::Error,
                    field: "llm.temperature".into(),
                    message: format!("{t} is outside 0.0..=2.0"),
                });
            }
        }
        if self.agent.max_steps == 0 {
            issues.push(ConfigIssue {
                severity: Severity::Warning,
                field: "agent.max_steps".into(),
                message: "step limit disabled; a looping model will never stop".into(),
            });
        }

        issues
    }
}
