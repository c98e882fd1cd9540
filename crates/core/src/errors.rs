use thiserror::Error;

/// Why a single backend request did not produce a usable result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestFailure {
    /// Network unreachable, connection reset, timeout.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The backend answered with a non-2xx status.
    #[error("HTTP status {0}")]
    HttpStatus(u16),
    /// The backend answered 2xx but the body was not the documented JSON.
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Unified error type for the entire stock-dashboard-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── API / Network ───────────────────────────────────────────────
    #[error("Request to {endpoint} failed: {cause}")]
    RequestFailed {
        endpoint: String,
        cause: RequestFailure,
    },

    // ── Rendering ───────────────────────────────────────────────────
    #[error("Render target not found: {0}")]
    RenderTargetMissing(String),

    // ── Coordination ────────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Session is not authenticated")]
    NotAuthenticated,

    #[error("Operation cancelled")]
    Cancelled,

    // ── Settings ────────────────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("File I/O error: {0}")]
    FileIO(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl CoreError {
    pub fn transport(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::RequestFailed {
            endpoint: endpoint.into(),
            cause: RequestFailure::Transport(message.into()),
        }
    }

    pub fn http_status(endpoint: impl Into<String>, status: u16) -> Self {
        CoreError::RequestFailed {
            endpoint: endpoint.into(),
            cause: RequestFailure::HttpStatus(status),
        }
    }

    pub fn decode(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::RequestFailed {
            endpoint: endpoint.into(),
            cause: RequestFailure::Decode(message.into()),
        }
    }

    /// HTTP status of a failed request, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            CoreError::RequestFailed {
                cause: RequestFailure::HttpStatus(status),
                ..
            } => Some(*status),
            _ => None,
        }
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}
