//! `get_weather`: a weather lookup that always asks a human first.

use serde::Deserialize;
use serde_json::Value;
use wh_domain::approval::{ApprovalRequest, ACCEPT, DENY};
use wh_domain::error::Error;
use wh_domain::tool::ToolDefinition;

use crate::approval::ApprovalGate;
use crate::registry::{parse_arguments, Capability, CapabilityError};

pub const NAME: &str = "get_weather";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeatherArgs {
    pub city: String,
}

/// The approval prompt shown before looking up `city`.
pub fn approval_request(city: &str) -> ApprovalRequest {
    ApprovalRequest::new(format!(
        "Do You allow for weather lookup in the city {city}?"
    ))
    .with_details(serde_json::json!({ "city": city }))
}

pub struct WeatherLookup;

#[async_trait::async_trait]
impl Capability for WeatherLookup {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: NAME.into(),
            description: "Use this tool to get weather data in given city".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "city": { "type": "string", "description": "City to look up" }
                },
                "required": ["city"],
                "additionalProperties": false
            }),
        }
    }

    async fn call(&self, arguments: Value, gate: &mut ApprovalGate) -> Result<String, CapabilityError> {
        let WeatherArgs { city } = parse_arguments(NAME, arguments)?;

        let decision = gate.request(approval_request(&city))?;
        match decision.as_str() {
            ACCEPT => Ok(format!("It's always sunny in {city}")),
            DENY => Ok(format!("You lack privileges to check weather in {city}")),
            other => Err(Error::UnrecognizedDecision {
                tool: NAME.into(),
                decision: other.to_owned(),
            }
            .into()),
        }
    }
}
