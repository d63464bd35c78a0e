//! Simplified transport view of a conversation.
//!
//! Presentation layers only ever see `{role, content}` pairs. Assistant
//! messages that carry nothing but tool calls have no displayable content
//! and are omitted from the view.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tool::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    Tool,
}

/// A display-ready message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Set on `tool` entries so the mapping back to [`Message`] is lossless.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// Map an internal message to its transport form.
///
/// Returns `None` for an assistant message with empty content.
pub fn to_transport(message: &Message) -> Option<ChatMessage> {
    match message {
        Message::User { content } => Some(ChatMessage {
            role: ChatRole::User,
            content: content.clone(),
            tool_call_id: None,
        }),
        Message::Assistant { content, .. } if content.is_empty() => None,
        Message::Assistant { content, .. } => Some(ChatMessage {
            role: ChatRole::Assistant,
            content: content.clone(),
            tool_call_id: None,
        }),
        Message::ToolResult {
            tool_call_id,
            content,
            ..
        } => Some(ChatMessage {
            role: ChatRole::Tool,
            content: content.clone(),
            tool_call_id: Some(tool_call_id.clone()),
        }),
    }
}

/// Rebuild an internal message from its transport form.
///
/// The tool name is not part of the transport view; rebuilt tool results
/// carry an empty `tool_name`.
pub fn from_transport(message: &ChatMessage) -> Result<Message> {
    match message.role {
        ChatRole::User => Ok(Message::user(&message.content)),
        ChatRole::Assistant => Ok(Message::assistant(&message.content)),
        ChatRole::Tool => {
            let call_id = message.tool_call_id.as_deref().ok_or_else(|| {
                Error::MalformedMessage("tool message without tool_call_id".into())
            })?;
            Ok(Message::tool_result(call_id, "", &message.content))
        }
    }
}

/// The display history for a whole conversation.
pub fn transcript(messages: &[Message]) -> Vec<ChatMessage> {
    messages.iter().filter_map(to_transport).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ToolCall;

    fn weather_call() -> ToolCall {
        ToolCall {
            call_id: "call_1".into(),
            tool_name: "get_weather".into(),
            arguments: serde_json::json!({ "city": "Paris" }),
        }
    }

    #[test]
    fn maps_each_role() {
        let user = to_transport(&Message::user("hi")).unwrap();
        assert_eq!(user.role, ChatRole::User);
        assert_eq!(user.content, "hi");

        let assistant = to_transport(&Message::assistant("hello")).unwrap();
        assert_eq!(assistant.role, ChatRole::Assistant);

        let tool = to_transport(&Message::tool_result("call_1", "get_weather", "sunny")).unwrap();
        assert_eq!(tool.role, ChatRole::Tool);
        assert_eq!(tool.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn tool_call_only_assistant_is_omitted() {
        let msg = Message::assistant_with_tools("", vec![weather_call()]);
        assert!(to_transport(&msg).is_none());
    }

    #[test]
    fn assistant_with_text_and_tool_calls_is_kept() {
        let msg = Message::assistant_with_tools("checking", vec![weather_call()]);
        let chat = to_transport(&msg).unwrap();
        assert_eq!(chat.content, "checking");
    }

    #[test]
    fn round_trip_preserves_role_and_content() {
        let originals = vec![
            Message::user("what's the weather?"),
            Message::assistant("let me see"),
            Message::tool_result("call_1", "get_weather", "It's always sunny in Paris"),
        ];
        for original in originals {
            let back = from_transport(&to_transport(&original).unwrap()).unwrap();
            assert_eq!(back.role(), original.role());
            assert_eq!(back.content(), original.content());
            assert_eq!(back.tool_call_id(), original.tool_call_id());
        }
    }

    #[test]
    fn tool_entry_without_call_id_is_malformed() {
        let chat = ChatMessage {
            role: ChatRole::Tool,
            content: "orphan".into(),
            tool_call_id: None,
        };
        assert!(matches!(from_transport(&chat), Err(Error::MalformedMessage(_))));
    }

    #[test]
    fn transcript_skips_silent_assistant_turns() {
        let history = vec![
            Message::user("weather in Paris?"),
            Message::assistant_with_tools("", vec![weather_call()]),
            Message::tool_result("call_1", "get_weather", "sunny"),
            Message::assistant("It is sunny."),
        ];
        let view = transcript(&history);
        let roles: Vec<ChatRole> = view.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![ChatRole::User, ChatRole::Tool, ChatRole::Assistant]);
    }
}
