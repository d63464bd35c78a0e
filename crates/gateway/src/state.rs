use std::sync::Arc;

use wh_domain::config::Config;
use wh_providers::LlmProvider;
use wh_sessions::ConversationStore;
use wh_tools::CapabilityRegistry;

use crate::runtime::session_lock::ConversationLocks;

/// Shared application state, built once at startup and passed explicitly
/// to the runtime, API handlers and CLI commands.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Model-generation collaborator used by the Responder node.
    pub provider: Arc<dyn LlmProvider>,
    pub tools: Arc<CapabilityRegistry>,
    pub conversations: Arc<ConversationStore>,
    pub locks: Arc<ConversationLocks>,
}

impl AppState {
    /// Wire a state around an already-built provider and registry, with
    /// empty conversation storage.
    pub fn new(
        config: Arc<Config>,
        provider: Arc<dyn LlmProvider>,
        tools: CapabilityRegistry,
    ) -> Self {
        Self {
            config,
            provider,
            tools: Arc::new(tools),
            conversations: Arc::new(ConversationStore::new()),
            locks: Arc::new(ConversationLocks::new()),
        }
    }
}
