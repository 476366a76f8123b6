//! Error types for the bridge

use thiserror::Error;

/// Fatal failure of a server call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Every attempt ended in a 5xx or a transport failure.
    #[error("Api Error: retries exhausted after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    /// Non-200, non-5xx status. Never retried.
    #[error("Api Error status_code:{0}")]
    Status(u16),

    /// The start call answered with a status other than `ok` or `started`.
    #[error("Start Api Error : status '{status}' in {raw}")]
    StartRejected { status: String, raw: String },

    /// A 200 whose body is not JSON.
    #[error("Api Error: malformed JSON body: {0}")]
    Decode(String),

    /// The HTTP client could not be built.
    #[error("Api Error: could not build HTTP client: {0}")]
    Client(String),
}

/// The server or the agent broke the text/JSON contract.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Protocol error: '{field}' has {actual} entries instead of {expected}")]
    FieldLength {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("Protocol error: malformed decision line '{0}'")]
    MalformedDecision(String),

    #[error("Protocol error: unexpected response shape: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        ProtocolError::Decode(err.to_string())
    }
}

/// Anything that stops the bridge loop abnormally.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Reading from or writing to the agent failed (other than a clean end-of-stream).
    #[error("Agent I/O error: {0}")]
    AgentIo(#[from] std::io::Error),
}

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;
