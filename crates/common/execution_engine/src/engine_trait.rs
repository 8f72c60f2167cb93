use async_trait::async_trait;

use crate::{errors::EngineError, new_payload_request::NewPayloadRequest};

#[async_trait]
pub trait ExecutionApi: Send + Sync {
    /// Submit ``new_payload_request`` to the execution client. When ``retry_on_syncing`` is set
    /// a ``SYNCING`` or ``ACCEPTED`` answer is treated as success, since canonicality is enforced
    /// by consensus.
    async fn notify_new_payload(
        &self,
        new_payload_request: NewPayloadRequest,
        retry_on_syncing: bool,
    ) -> Result<(), EngineError>;
}
