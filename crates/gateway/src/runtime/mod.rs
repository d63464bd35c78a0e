//! Core runtime: the session facade over the execution graph.
//!
//! Entry points: [`Session::invoke`] starts a run from a user message and
//! [`Session::resume`] continues a run parked on an approval. Both return
//! the display history plus the pending approval request, if any.

pub mod graph;
pub mod session_lock;

use serde::Serialize;
use tracing::Instrument;

use wh_domain::approval::ApprovalRequest;
use wh_domain::error::{Error, Result};
use wh_domain::tool::Message;
use wh_domain::transport::{transcript, ChatMessage};

use crate::state::AppState;

use self::graph::Graph;

/// What callers see after `invoke` or `resume`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReply {
    /// Full display history of the conversation.
    pub messages: Vec<ChatMessage>,
    /// Set when the run stopped on an approval.
    pub pending_approval: Option<ApprovalRequest>,
}

/// Read-only view of a conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationView {
    pub id: String,
    pub messages: Vec<ChatMessage>,
    pub pending_approval: Option<ApprovalRequest>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// The two entry points presentation layers call.
#[derive(Clone)]
pub struct Session {
    state: AppState,
}

impl Session {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Drive the graph with a new user message until it finishes or
    /// suspends. Nothing is committed if the first model turn fails.
    ///
    /// Fails with [`Error::ProtocolViolation`] while an approval is pending.
    pub async fn invoke(&self, conversation_id: &str, text: &str) -> Result<SessionReply> {
        let _permit = self.state.locks.acquire(conversation_id).await?;
        let span = tracing::info_span!("invoke", conversation_id);

        async {
            let store = &self.state.conversations;
            if store.get_pending(conversation_id).is_some() {
                return Err(Error::ProtocolViolation(
                    "an approval is pending; resume the conversation first".into(),
                ));
            }

            let pending = Graph::new(&self.state, conversation_id)
                .start(Message::user(text))
                .await?;
            Ok(self.reply(conversation_id, pending))
        }
        .instrument(span)
        .await
    }

    /// Supply the decision for the pending approval and drive the graph on.
    ///
    /// Fails with [`Error::ProtocolViolation`] when nothing is pending.
    pub async fn resume(&self, conversation_id: &str, decision: &str) -> Result<SessionReply> {
        let _permit = self.state.locks.acquire(conversation_id).await?;
        let span = tracing::info_span!("resume", conversation_id);

        async {
            let pending = self
                .state
                .conversations
                .get_pending(conversation_id)
                .ok_or_else(|| {
                    Error::ProtocolViolation("no approval is pending for this conversation".into())
                })?;

            let pending = Graph::new(&self.state, conversation_id)
                .resume(pending, decision.to_owned())
                .await?;
            Ok(self.reply(conversation_id, pending))
        }
        .instrument(span)
        .await
    }

    /// Snapshot of a conversation, or `None` if it was never invoked.
    pub fn conversation(&self, conversation_id: &str) -> Option<ConversationView> {
        self.state
            .conversations
            .get(conversation_id)
            .map(|c| ConversationView {
                messages: transcript(&c.messages),
                pending_approval: c.pending.map(|p| p.request),
                id: c.id,
                created_at: c.created_at,
                updated_at: c.updated_at,
            })
    }

    fn reply(&self, conversation_id: &str, pending_approval: Option<ApprovalRequest>) -> SessionReply {
        SessionReply {
            messages: transcript(&self.state.conversations.history(conversation_id)),
            pending_approval,
        }
    }
}
