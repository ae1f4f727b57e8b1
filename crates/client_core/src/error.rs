use thiserror::Error;

/// Transport-level failure talking to the lab backend. Any of these is a
/// TransportFailure from the controllers' point of view; in-body
/// `success: false` is reported separately as a `DomainFailure`.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned HTTP {status}{}", message_suffix(.message))]
    Status {
        endpoint: String,
        status: u16,
        message: Option<String>,
    },
    #[error("invalid server url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("server url {0} cannot carry api path segments")]
    CannotBeABase(String),
}

impl ClientError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn message_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|message| format!(": {message}"))
        .unwrap_or_default()
}
