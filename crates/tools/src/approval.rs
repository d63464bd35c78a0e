//! Approval gate: lets a capability body pause for a human decision.
//!
//! The gate replays a decision log. Each call to [`ApprovalGate::request`]
//! consumes the next recorded decision; once the log runs out it returns
//! [`Suspension`], which the body propagates with `?`. The caller parks the
//! request, and when a decision arrives it runs the body again with the log
//! extended by one entry. The body sees `request` return that decision as if
//! it had never stopped.
//!
//! Bodies must therefore be deterministic up to each `request` call and must
//! not produce side effects before their last one.

use wh_domain::approval::ApprovalRequest;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A capability body halted on an approval request with no recorded answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Suspension(pub ApprovalRequest);

impl Suspension {
    pub fn into_request(self) -> ApprovalRequest {
        self.0
    }
}

/// Decision log for one capability invocation.
#[derive(Debug, Default, Clone)]
pub struct ApprovalGate {
    decisions: Vec<String>,
    cursor: usize,
}

impl ApprovalGate {
    /// A gate with no recorded decisions: the first `request` suspends.
    pub fn new() -> Self {
        Self::default()
    }

    /// A gate that answers the first `decisions.len()` requests from the log.
    pub fn replay(decisions: Vec<String>) -> Self {
        Self {
            decisions,
            cursor: 0,
        }
    }

    /// Ask for a decision.
    ///
    /// Returns the next recorded decision, or `Err(Suspension)` carrying
    /// `payload` when every recorded decision has been consumed.
    pub fn request(&mut self, payload: ApprovalRequest) -> Result<String, Suspension> {
        match self.decisions.get(self.cursor) {
            Some(decision) => {
                self.cursor += 1;
                tracing::debug!(
                    index = self.cursor,
                    decision = %decision,
                    "approval replayed"
                );
                Ok(decision.clone())
            }
            None => {
                tracing::debug!(index = self.cursor, query = %payload.query, "approval required");
                Err(Suspension(payload))
            }
        }
    }

    /// The full decision log.
    pub fn decisions(&self) -> &[String] {
        &self.decisions
    }

    /// Number of decisions consumed so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
