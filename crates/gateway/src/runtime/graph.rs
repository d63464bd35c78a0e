//! The execution graph: Responder and ToolRunner nodes driven in a loop.
//!
//! `Responder` asks the model for the next assistant message. If that
//! message requests tools, `ToolRunner` executes them in call order and the
//! loop returns to `Responder`; otherwise the run is done.
//!
//! Every step is atomic. A step either commits all of its messages or none
//! of them. A ToolRunner step that hits an approval commits nothing and
//! parks a [`PendingApproval`] whose continuation lets [`Graph::resume`]
//! finish the same step later.
//!
//! A ToolRunner step that fails withdraws the Responder commit that asked
//! for the calls, so the history never ends on tool calls without results.
//! A new user message is staged and only committed together with the first
//! assistant reply.

use tracing::Instrument;

use wh_domain::approval::{ApprovalRequest, Continuation, PendingApproval};
use wh_domain::error::{Error, Result};
use wh_domain::tool::{Message, ToolCall};
use wh_domain::trace::TraceEvent;
use wh_providers::ChatRequest;
use wh_tools::{ApprovalGate, CapabilityOutcome};

use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Nodes and outcomes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Responder,
    ToolRunner,
}

impl Node {
    fn as_str(self) -> &'static str {
        match self {
            Node::Responder => "responder",
            Node::ToolRunner => "tool_runner",
        }
    }
}

/// What a single step decided.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Next(Node),
    Done,
    /// The step halted on an approval; the pending approval is parked.
    Suspended(ApprovalRequest),
}

/// Routing after a Responder step: tools requested means ToolRunner.
pub fn route(message: &Message) -> StepOutcome {
    if message.tool_calls().is_empty() {
        StepOutcome::Done
    } else {
        StepOutcome::Next(Node::ToolRunner)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Graph
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One conversation's execution graph. The caller must hold the
/// conversation's lock for the whole drive.
pub struct Graph<'a> {
    state: &'a AppState,
    conversation_id: &'a str,
}

impl<'a> Graph<'a> {
    pub fn new(state: &'a AppState, conversation_id: &'a str) -> Self {
        Self {
            state,
            conversation_id,
        }
    }

    /// Drive the graph from `start` until it finishes or suspends.
    ///
    /// Returns the approval request when the run suspended.
    pub async fn run(&self, start: Node) -> Result<Option<ApprovalRequest>> {
        self.drive(start, Vec::new()).await
    }

    /// Drive the graph for a new user message. Nothing is committed unless
    /// the first Responder step succeeds.
    pub async fn start(&self, user: Message) -> Result<Option<ApprovalRequest>> {
        self.drive(Node::Responder, vec![user]).await
    }

    async fn drive(&self, start: Node, mut staged: Vec<Message>) -> Result<Option<ApprovalRequest>> {
        let max_steps = self.state.config.agent.max_steps;
        let mut responder_turns = 0usize;
        // History length before the latest Responder commit.
        let mut checkpoint: Option<usize> = None;
        let mut node = start;

        loop {
            let outcome = match node {
                Node::Responder => {
                    if max_steps > 0 && responder_turns >= max_steps {
                        tracing::warn!(
                            conversation_id = self.conversation_id,
                            max_steps,
                            "step limit reached"
                        );
                        return Err(Error::StepLimitExceeded(max_steps));
                    }
                    responder_turns += 1;
                    checkpoint = Some(self.state.conversations.history(self.conversation_id).len());
                    self.respond(std::mem::take(&mut staged)).await?
                }
                Node::ToolRunner => match self.run_tools().await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        self.withdraw(checkpoint);
                        return Err(e);
                    }
                },
            };

            match outcome {
                StepOutcome::Next(next) => node = next,
                StepOutcome::Done => return Ok(None),
                StepOutcome::Suspended(request) => return Ok(Some(request)),
            }
        }
    }

    /// Finish the suspended ToolRunner step with `decision`, then keep
    /// driving the graph.
    pub async fn resume(&self, pending: PendingApproval, decision: String) -> Result<Option<ApprovalRequest>> {
        match self.resume_step(pending, decision).await? {
            StepOutcome::Next(node) => self.run(node).await,
            StepOutcome::Done => Ok(None),
            StepOutcome::Suspended(request) => Ok(Some(request)),
        }
    }

    // ── Responder ────────────────────────────────────────────────────

    async fn respond(&self, mut staged: Vec<Message>) -> Result<StepOutcome> {
        let span = tracing::info_span!(
            "step",
            conversation_id = self.conversation_id,
            node = Node::Responder.as_str(),
        );

        async move {
            let agent = &self.state.config.agent;
            let llm = &self.state.config.llm;
            let mut messages = self.state.conversations.history(self.conversation_id);
            messages.extend(staged.iter().cloned());
            let req = ChatRequest {
                system: agent.system_prompt.clone(),
                messages,
                tools: self.state.tools.list(),
                temperature: llm.temperature,
                max_tokens: llm.max_tokens,
                model: None,
            };

            let response = self.state.provider.chat(&req).await.map_err(|e| {
                tracing::warn!(
                    provider = self.state.provider.provider_id(),
                    error = %e,
                    "model generation failed"
                );
                Error::GenerationUnavailable(e.to_string())
            })?;

            let message = response.into_message();
            if message.content().is_empty() && message.tool_calls().is_empty() {
                tracing::warn!(
                    provider = self.state.provider.provider_id(),
                    "model returned an empty message"
                );
                return Err(Error::GenerationUnavailable(
                    "model returned neither text nor tool calls".into(),
                ));
            }

            let outcome = route(&message);
            tracing::debug!(tool_calls = message.tool_calls().len(), "assistant message");
            staged.push(message);
            self.commit(Node::Responder, staged);
            Ok(outcome)
        }
        .instrument(span)
        .await
    }

    // ── ToolRunner ───────────────────────────────────────────────────

    async fn run_tools(&self) -> Result<StepOutcome> {
        let calls = self.pending_calls()?;
        self.execute(&calls, Vec::new(), Vec::new()).await
    }

    async fn resume_step(&self, pending: PendingApproval, decision: String) -> Result<StepOutcome> {
        let Continuation {
            call,
            mut decisions,
            completed,
        } = pending.continuation;

        TraceEvent::ApprovalResolved {
            conversation_id: self.conversation_id.to_owned(),
            call_id: call.call_id.clone(),
            tool_name: call.tool_name.clone(),
            decision: decision.clone(),
        }
        .emit();

        let calls = self.pending_calls()?;
        let start = calls
            .iter()
            .position(|c| c.call_id == call.call_id)
            .ok_or_else(|| {
                Error::Other(format!(
                    "suspended call {} is not on the latest assistant message",
                    call.call_id
                ))
            })?;

        decisions.push(decision);
        match self.execute(&calls[start..], completed, decisions).await {
            Ok(outcome) => Ok(outcome),
            // The pending approval stays parked so the caller can retry
            // with a recognized value.
            Err(e @ Error::UnrecognizedDecision { .. }) => Err(e),
            // Any other failure abandons the step and the calls with it.
            Err(e) => {
                self.state
                    .conversations
                    .set_pending(self.conversation_id, None);
                self.withdraw(None);
                Err(e)
            }
        }
    }

    /// Tool calls on the latest assistant message.
    fn pending_calls(&self) -> Result<Vec<ToolCall>> {
        self.state
            .conversations
            .history(self.conversation_id)
            .iter()
            .rev()
            .find(|m| matches!(m, Message::Assistant { .. }))
            .map(|m| m.tool_calls().to_vec())
            .ok_or_else(|| Error::Other("no assistant message to run tools for".into()))
    }

    /// Run `calls` in order. The first call replays `decisions`; results
    /// already in `completed` are kept ahead of the new ones.
    async fn execute(
        &self,
        calls: &[ToolCall],
        mut completed: Vec<Message>,
        mut decisions: Vec<String>,
    ) -> Result<StepOutcome> {
        let span = tracing::info_span!(
            "step",
            conversation_id = self.conversation_id,
            node = Node::ToolRunner.as_str(),
        );

        async move {
            for call in calls {
                let mut gate = ApprovalGate::replay(std::mem::take(&mut decisions));
                let outcome = self
                    .state
                    .tools
                    .invoke(&call.tool_name, call.arguments.clone(), &mut gate)
                    .instrument(tracing::info_span!(
                        "tool",
                        call_id = %call.call_id,
                        tool_name = %call.tool_name,
                    ))
                    .await?;

                match outcome {
                    CapabilityOutcome::Completed(content) => {
                        completed.push(Message::tool_result(
                            &call.call_id,
                            &call.tool_name,
                            content,
                        ));
                    }
                    CapabilityOutcome::Suspended(request) => {
                        TraceEvent::ApprovalRequested {
                            conversation_id: self.conversation_id.to_owned(),
                            call_id: call.call_id.clone(),
                            tool_name: call.tool_name.clone(),
                        }
                        .emit();

                        let pending = PendingApproval::new(
                            request.clone(),
                            Continuation {
                                call: call.clone(),
                                decisions: gate.decisions().to_vec(),
                                completed,
                            },
                        );
                        self.state
                            .conversations
                            .set_pending(self.conversation_id, Some(pending));
                        return Ok(StepOutcome::Suspended(request));
                    }
                }
            }

            self.state
                .conversations
                .set_pending(self.conversation_id, None);
            self.commit(Node::ToolRunner, completed);
            Ok(StepOutcome::Next(Node::Responder))
        }
        .instrument(span)
        .await
    }

    /// Take back the Responder commit whose tool calls failed. Without a
    /// recorded checkpoint, the latest assistant message is withdrawn.
    fn withdraw(&self, checkpoint: Option<usize>) {
        let store = &self.state.conversations;
        let len = match checkpoint {
            Some(len) => len,
            None => match store
                .history(self.conversation_id)
                .iter()
                .rposition(|m| matches!(m, Message::Assistant { .. }))
            {
                Some(index) => index,
                None => return,
            },
        };

        let removed = store.truncate(self.conversation_id, len);
        if removed > 0 {
            tracing::warn!(
                conversation_id = self.conversation_id,
                removed,
                "tool step failed, assistant turn withdrawn"
            );
            TraceEvent::StepWithdrawn {
                conversation_id: self.conversation_id.to_owned(),
                messages: removed,
            }
            .emit();
        }
    }

    fn commit(&self, node: Node, messages: Vec<Message>) {
        let count = messages.len();
        self.state.conversations.append(self.conversation_id, messages);
        TraceEvent::StepCommitted {
            conversation_id: self.conversation_id.to_owned(),
            node: node.as_str().to_owned(),
            messages: count,
        }
        .emit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_on_tool_calls_only() {
        assert_eq!(route(&Message::assistant("hi")), StepOutcome::Done);

        let call = ToolCall {
            call_id: "c1".into(),
            tool_name: "get_weather".into(),
            arguments: serde_json::json!({ "city": "Oslo" }),
        };
        assert_eq!(
            route(&Message::assistant_with_tools("checking", vec![call])),
            StepOutcome::Next(Node::ToolRunner)
        );
    }
}
