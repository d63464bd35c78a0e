//! In-memory conversation store.
//!
//! Histories grow by whole steps. The only removal is [`ConversationStore::truncate`],
//! which withdraws a step whose follow-up failed. Callers that need several
//! operations to appear atomic (the session runtime) hold the
//! per-conversation lock around them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use wh_domain::approval::PendingApproval;
use wh_domain::tool::Message;
use wh_domain::trace::TraceEvent;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Conversation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One conversation: ordered messages plus zero-or-one pending approval.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub id: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingApproval>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    fn new(id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_owned(),
            messages: Vec::new(),
            pending: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Listing row for a conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub id: String,
    pub messages: usize,
    pub pending_approval: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Conversation> for ConversationSummary {
    fn from(c: &Conversation) -> Self {
        Self {
            id: c.id.clone(),
            messages: c.messages.len(),
            pending_approval: c.pending.is_some(),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Conversations keyed by id.
#[derive(Default)]
pub struct ConversationStore {
    conversations: RwLock<HashMap<String, Conversation>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the conversation if it does not exist. Returns `true` if it
    /// was created by this call.
    pub fn ensure(&self, id: &str) -> bool {
        // Fast path: conversation already exists.
        if self.conversations.read().contains_key(id) {
            return false;
        }

        let mut conversations = self.conversations.write();
        if conversations.contains_key(id) {
            return false;
        }
        conversations.insert(id.to_owned(), Conversation::new(id));

        TraceEvent::ConversationCreated {
            conversation_id: id.to_owned(),
        }
        .emit();
        true
    }

    /// Append messages in order, creating the conversation if needed.
    pub fn append(&self, id: &str, messages: Vec<Message>) {
        if messages.is_empty() {
            return;
        }
        self.ensure(id);
        let mut conversations = self.conversations.write();
        if let Some(conv) = conversations.get_mut(id) {
            conv.messages.extend(messages);
            conv.updated_at = Utc::now();
        }
    }

    /// Drop every message from index `len` on. Returns how many were
    /// removed.
    pub fn truncate(&self, id: &str, len: usize) -> usize {
        let mut conversations = self.conversations.write();
        let Some(conv) = conversations.get_mut(id) else {
            return 0;
        };
        let removed = conv.messages.len().saturating_sub(len);
        if removed > 0 {
            conv.messages.truncate(len);
            conv.updated_at = Utc::now();
        }
        removed
    }

    /// The full history, oldest first. Empty for unknown ids.
    pub fn history(&self, id: &str) -> Vec<Message> {
        self.conversations
            .read()
            .get(id)
            .map(|c| c.messages.clone())
            .unwrap_or_default()
    }

    /// Park or clear the pending approval.
    pub fn set_pending(&self, id: &str, pending: Option<PendingApproval>) {
        if pending.is_some() {
            self.ensure(id);
        }
        let mut conversations = self.conversations.write();
        if let Some(conv) = conversations.get_mut(id) {
            conv.pending = pending;
            conv.updated_at = Utc::now();
        }
    }

    pub fn get_pending(&self, id: &str) -> Option<PendingApproval> {
        self.conversations
            .read()
            .get(id)
            .and_then(|c| c.pending.clone())
    }

    /// Snapshot of one conversation.
    pub fn get(&self, id: &str) -> Option<Conversation> {
        self.conversations.read().get(id).cloned()
    }

    /// All conversations, oldest first.
    pub fn list(&self) -> Vec<ConversationSummary> {
        let mut rows: Vec<ConversationSummary> = self
            .conversations
            .read()
            .values()
            .map(ConversationSummary::from)
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        rows
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
