//! Shared vocabulary for whisperer: messages, approval state, errors,
//! configuration, and trace events.

pub mod approval;
pub mod config;
pub mod error;
pub mod tool;
pub mod trace;
pub mod transport;
pub mod usage;
