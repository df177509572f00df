//! Errors of the bridge.
//!
//! Lifecycle handling never surfaces these to the host; they are logged and
//! absorbed. Direct callers of [`crate::SseBridge::connect`] and platform
//! entry points get them as values.

/// Error returned by bridge operations and platform glue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The transport refused to open a connection to `url`.
    Open { url: String, reason: String },
    /// Configuration could not be parsed.
    Config(String),
    /// A host collaborator (e.g. the global `htmx` object) is missing or unusable.
    HostUnavailable(String),
}

impl BridgeError {
    pub fn open(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Open {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeError::Open { url, reason } => {
                write!(f, "failed to open event source '{url}': {reason}")
            }
            BridgeError::Config(reason) => write!(f, "invalid bridge config: {reason}"),
            BridgeError::HostUnavailable(reason) => write!(f, "host unavailable: {reason}"),
        }
    }
}

impl std::error::Error for BridgeError {}

impl From<serde_json::Error> for BridgeError {
    fn from(error: serde_json::Error) -> Self {
        BridgeError::Config(error.to_string())
    }
}
