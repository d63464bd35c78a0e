//! whisperer gateway: the execution graph, session facade, HTTP API and CLI.

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod runtime;
pub mod state;

pub use runtime::{Session, SessionReply};
pub use state::AppState;
