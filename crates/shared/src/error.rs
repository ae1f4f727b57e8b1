use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON body the backend attaches to failed requests. Instance routes use
/// `message`, challenge and grading routes use `error`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error
            .or(self.message)
            .filter(|message| !message.trim().is_empty())
    }
}

/// The request went through but the server reported `success: false`.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct DomainFailure {
    pub message: String,
    /// Whether `message` came from the server or is the caller's fallback.
    pub server_supplied: bool,
}

impl DomainFailure {
    pub fn new(server_message: Option<String>, fallback: impl Into<String>) -> Self {
        match server_message.filter(|message| !message.trim().is_empty()) {
            Some(message) => Self {
                message,
                server_supplied: true,
            },
            None => Self {
                message: fallback.into(),
                server_supplied: false,
            },
        }
    }
}
