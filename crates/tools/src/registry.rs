//! Capability registry: declares the tools the model may call and
//! dispatches calls to them by name.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use wh_domain::approval::ApprovalRequest;
use wh_domain::error::{Error, Result};
use wh_domain::tool::ToolDefinition;

use crate::approval::{ApprovalGate, Suspension};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Capability trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Why a capability body stopped without a result.
#[derive(Debug)]
pub enum CapabilityError {
    /// The body is waiting on a human decision.
    Suspended(Suspension),
    /// The body failed.
    Failed(Error),
}

impl From<Suspension> for CapabilityError {
    fn from(s: Suspension) -> Self {
        Self::Suspended(s)
    }
}

impl From<Error> for CapabilityError {
    fn from(e: Error) -> Self {
        Self::Failed(e)
    }
}

/// A named action the model can ask for.
#[async_trait::async_trait]
pub trait Capability: Send + Sync {
    /// Name, description and argument schema advertised to the model.
    fn definition(&self) -> ToolDefinition;

    /// Run the body. Any approval goes through `gate`.
    async fn call(&self, arguments: Value, gate: &mut ApprovalGate)
        -> std::result::Result<String, CapabilityError>;
}

/// Deserialize capability arguments into their typed form.
///
/// Argument structs use `#[serde(deny_unknown_fields)]`, so any mismatch
/// with the declared schema fails here as [`Error::InvalidArguments`].
pub fn parse_arguments<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|e| Error::InvalidArguments {
        tool: tool.to_owned(),
        message: e.to_string(),
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Registry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Result of one registry dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityOutcome {
    Completed(String),
    Suspended(ApprovalRequest),
}

/// Capabilities in registration order.
#[derive(Default)]
pub struct CapabilityRegistry {
    capabilities: Vec<Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a capability. A capability with the same name is replaced in place.
    pub fn register(&mut self, capability: Arc<dyn Capability>) {
        let name = capability.definition().name;
        match self
            .capabilities
            .iter()
            .position(|c| c.definition().name == name)
        {
            Some(idx) => {
                tracing::warn!(capability = %name, "replacing registered capability");
                self.capabilities[idx] = capability;
            }
            None => self.capabilities.push(capability),
        }
    }

    /// Definitions advertised to the model, in registration order.
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.capabilities.iter().map(|c| c.definition()).collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.capabilities
            .iter()
            .find(|c| c.definition().name == name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Run the named capability against a decision log.
    ///
    /// The gate starts from `gate`'s recorded decisions. A body that asks for
    /// more decisions than were recorded yields
    /// [`CapabilityOutcome::Suspended`].
    pub async fn invoke(
        &self,
        name: &str,
        arguments: Value,
        gate: &mut ApprovalGate,
    ) -> Result<CapabilityOutcome> {
        let capability = self
            .get(name)
            .ok_or_else(|| Error::UnknownCapability(name.to_owned()))?;

        match capability.call(arguments, gate).await {
            Ok(output) => {
                tracing::debug!(capability = %name, "capability completed");
                Ok(CapabilityOutcome::Completed(output))
            }
            Err(CapabilityError::Suspended(suspension)) => {
                Ok(CapabilityOutcome::Suspended(suspension.into_request()))
            }
            Err(CapabilityError::Failed(e)) => {
                tracing::warn!(capability = %name, error = %e, "capability failed");
                Err(e)
            }
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
