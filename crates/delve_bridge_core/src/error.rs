use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Text Delve uses when the tracee has terminated, e.g.
/// "Process 4242 has exited with status 1".
const PROCESS_EXITED_MARKER: &str = "has exited with status";

#[derive(Error, Debug)]
pub enum DelveError {
    #[error("connect {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    /// An error string returned by the engine. Displayed verbatim.
    #[error("{message}")]
    JsonRpc { message: String },

    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A request that could not be formed or resolved on this side.
    #[error("{0}")]
    Request(String),

    #[error(
        "no DLV_ADDR and {} not found (start headless dlv and set DLV_ADDR or write address to {})",
        path.display(),
        path.display()
    )]
    NoSession { path: PathBuf },

    #[error("{0}")]
    EngineNotFound(String),

    #[error("unexpected dlv output: {0}")]
    Startup(String),

    #[error("timed out waiting for dlv to start")]
    StartupTimeout,

    #[error("invalid pid in {}: {value:?}", path.display())]
    InvalidPid { path: PathBuf, value: String },
}

impl DelveError {
    pub fn json_rpc(message: impl Into<String>) -> Self {
        Self::JsonRpc {
            message: message.into(),
        }
    }

    /// True when the engine reports that the tracee has terminated. This is the
    /// natural end of a debugging session, not a protocol failure.
    pub fn is_process_exited(&self) -> bool {
        match self {
            Self::JsonRpc { message } => is_exit_message(message),
            _ => false,
        }
    }
}

pub fn is_exit_message(message: &str) -> bool {
    message.contains(PROCESS_EXITED_MARKER)
}
