//! Suspended-execution state for human approval.
//!
//! A capability that needs a human decision hands an [`ApprovalRequest`] to
//! the approval gate. The step halts and the conversation parks a
//! [`PendingApproval`] until the caller resumes with a decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tool::{Message, ToolCall};

/// Affirmative decision value understood by built-in capabilities.
pub const ACCEPT: &str = "accept";
/// Negative decision value understood by built-in capabilities.
pub const DENY: &str = "deny";

/// Payload surfaced to the caller as an approval prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Question to show the human reviewer.
    pub query: String,
    /// Structured context for the prompt (e.g. the capability arguments).
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

impl ApprovalRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            details: Value::Null,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

/// Everything needed to re-enter a suspended ToolRunner step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Continuation {
    /// The tool call whose body is suspended.
    pub call: ToolCall,
    /// Decisions already supplied to this call, in `request` order.
    /// Replaying the body against this log brings it back to the
    /// suspension point.
    #[serde(default)]
    pub decisions: Vec<String>,
    /// Results of calls that completed earlier in the same step.
    /// They are committed together with the rest of the step.
    #[serde(default)]
    pub completed: Vec<Message>,
}

/// A suspended capability execution awaiting a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingApproval {
    pub request: ApprovalRequest,
    pub continuation: Continuation,
    pub created_at: DateTime<Utc>,
}

impl PendingApproval {
    pub fn new(request: ApprovalRequest, continuation: Continuation) -> Self {
        Self {
            request,
            continuation,
            created_at: Utc::now(),
        }
    }
}
