//! Built-in capabilities for whisperer.
//!
//! - `approval`: the gate a capability body calls to ask a human for a decision
//! - `registry`: named capabilities with typed arguments, dispatched by name
//! - `weather`: the `get_weather` lookup, which always asks before answering

pub mod approval;
pub mod registry;
pub mod weather;

pub use approval::{ApprovalGate, Suspension};
pub use registry::{Capability, CapabilityError, CapabilityOutcome, CapabilityRegistry};
pub use weather::WeatherLookup;

/// Registry preloaded with every built-in capability.
pub fn builtin_registry() -> CapabilityRegistry {
    let mut registry = CapabilityRegistry::new();
    registry.register(std::sync::Arc::new(WeatherLookup));
    registry
}
