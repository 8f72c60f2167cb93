use thiserror::Error;

use crate::rpc_types::payload_status::PayloadStatus;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Execution client rejected payload: {0}")]
    InvalidPayload(String),

    #[error("Execution client rejected payload block hash: {0}")]
    InvalidBlockHash(String),

    #[error("Execution client is syncing")]
    Syncing,

    #[error("Execution client accepted payload without validating it")]
    Accepted,

    #[error("Execution client is unavailable: {0}")]
    Unavailable(String),

    #[error("Execution client did not respond within {0:?}")]
    Timeout(std::time::Duration),

    #[error("Engine API call failed: {0}")]
    Rpc(String),
}

impl EngineError {
    /// Whether the payload itself was judged invalid, as opposed to the engine being unable to
    /// judge it.
    pub fn is_invalid_payload(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidPayload(_) | EngineError::InvalidBlockHash(_)
        )
    }

    pub fn from_status(status: PayloadStatus, validation_error: Option<String>) -> Option<Self> {
        let reason = validation_error.unwrap_or_default();
        match status {
            PayloadStatus::Valid => None,
            PayloadStatus::Invalid => Some(EngineError::InvalidPayload(reason)),
            PayloadStatus::InvalidBlockHash => Some(EngineError::InvalidBlockHash(reason)),
            PayloadStatus::Syncing => Some(EngineError::Syncing),
            PayloadStatus::Accepted => Some(EngineError::Accepted),
        }
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            EngineError::Unavailable(err.to_string())
        } else {
            EngineError::Rpc(err.to_string())
        }
    }
}
