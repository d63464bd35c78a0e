//! Conversation state for whisperer.
//!
//! Each conversation id maps to an append-only message history plus at most
//! one suspended approval. State lives for the lifetime of the process.

pub mod store;

pub use store::{Conversation, ConversationStore, ConversationSummary};
