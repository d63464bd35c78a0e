pub mod google;
pub mod traits;
pub mod util;

use std::sync::Arc;

use wh_domain::config::{LlmConfig, ProviderKind};
use wh_domain::error::Result;

// Re-exports for convenience.
pub use google::GoogleProvider;
pub use traits::{ChatRequest, ChatResponse, LlmProvider};

/// Build the configured model backend.
///
/// Fails when the provider's API key cannot be resolved, so a missing
/// key surfaces at startup instead of on the first turn.
pub fn build_provider(cfg: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    match cfg.provider.kind {
        ProviderKind::Google => {
            let provider = GoogleProvider::from_llm_config(cfg)?;
            tracing::info!(
                provider = %cfg.provider.id,
                base_url = %cfg.provider.base_url,
                "LLM provider initialized"
            );
            Ok(Arc::new(provider))
        }
    }
}
