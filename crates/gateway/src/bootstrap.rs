//! AppState construction shared by `serve` and `chat`.

use std::sync::Arc;

use anyhow::Context;

use wh_domain::config::{Config, Severity};

use crate::state::AppState;

/// Validate config, initialize every subsystem and return a fully-wired
/// [`AppState`].
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            Severity::Warning => tracing::warn!("config: {issue}"),
            Severity::Error => tracing::error!("config: {issue}"),
        }
    }
    let errors = issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count();
    if errors > 0 {
        anyhow::bail!("config validation failed with {errors} error(s)");
    }

    // ── LLM provider ─────────────────────────────────────────────────
    let provider =
        wh_providers::build_provider(&config.llm).context("initializing LLM provider")?;

    // ── Capabilities ─────────────────────────────────────────────────
    let tools = wh_tools::builtin_registry();
    tracing::info!(
        tools = ?tools.list().iter().map(|t| t.name.clone()).collect::<Vec<_>>(),
        "capabilities registered"
    );

    Ok(AppState::new(config, provider, tools))
}

/// Start the periodic housekeeping tasks. Must run inside a tokio runtime.
pub fn spawn_maintenance(state: &AppState) {
    // ── Idle conversation lock pruning ───────────────────────────────
    let locks = state.locks.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            let pruned = locks.prune_idle();
            if pruned > 0 {
                tracing::debug!(pruned, "idle conversation locks pruned");
            }
        }
    });
}
