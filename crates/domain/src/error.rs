/// Shared error type used across all whisperer crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("config: {0}")]
    Config(String),

    #[error("auth: {0}")]
    Auth(String),

    /// Capability arguments did not match the declared schema.
    #[error("invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("unknown capability: {0}")]
    UnknownCapability(String),

    /// A resumed capability received a decision outside its accepted set.
    #[error("unrecognized decision for {tool}: {decision:?}")]
    UnrecognizedDecision { tool: String, decision: String },

    /// `invoke` while an approval is pending, or `resume` while none is.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// The model collaborator failed; nothing was committed.
    #[error("generation unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("step limit reached ({0} model turns)")]
    StepLimitExceeded(usize),

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
