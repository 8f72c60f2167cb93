use std::{
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    engine_trait::ExecutionApi,
    errors::EngineError,
    new_payload_request::NewPayloadRequest,
    resolve_payload_status,
    rpc_types::payload_status::{PayloadStatus, PayloadStatusV1},
};

#[derive(Deserialize, Debug)]
pub struct MockExecutionEngine {
    payload_status: PayloadStatus,
    #[serde(default)]
    unavailable: bool,
    #[serde(skip)]
    notified: AtomicUsize,
}

impl Default for MockExecutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExecutionEngine {
    pub fn new() -> Self {
        Self {
            payload_status: PayloadStatus::Valid,
            unavailable: false,
            notified: AtomicUsize::new(0),
        }
    }

    pub fn from_file(execution_yaml_path: &Path) -> anyhow::Result<MockExecutionEngine> {
        let file = std::fs::File::open(execution_yaml_path)?;
        Ok(serde_yaml::from_reader(file)?)
    }

    pub fn set_payload_status(&mut self, payload_status: PayloadStatus) {
        self.payload_status = payload_status;
    }

    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    /// Number of payloads submitted so far.
    pub fn notified(&self) -> usize {
        self.notified.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecutionApi for MockExecutionEngine {
    async fn notify_new_payload(
        &self,
        _new_payload_request: NewPayloadRequest,
        retry_on_syncing: bool,
    ) -> Result<(), EngineError> {
        self.notified.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(EngineError::Unavailable("mock engine is offline".to_string()));
        }
        resolve_payload_status(
            PayloadStatusV1 {
                status: self.payload_status,
                latest_valid_hash: None,
                validation_error: None,
            },
            retry_on_syncing,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use stf_consensus::{execution_payload::ExecutionPayload, execution_requests::ExecutionRequests};
    use tempdir::TempDir;

    use super::*;

    fn request() -> NewPayloadRequest {
        NewPayloadRequest {
            execution_payload: ExecutionPayload::default(),
            versioned_hashes: vec![],
            parent_beacon_block_root: Default::default(),
            execution_requests: ExecutionRequests::default(),
        }
    }

    #[tokio::test]
    async fn test_mock_from_file() {
        let dir = TempDir::new("mock_engine").unwrap();
        let path = dir.path().join("execution.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"payload_status: INVALID\n").unwrap();

        let engine = MockExecutionEngine::from_file(&path).unwrap();
        let err = engine.notify_new_payload(request(), true).await.unwrap_err();
        assert!(err.is_invalid_payload());
        assert_eq!(engine.notified(), 1);
    }

    #[tokio::test]
    async fn test_mock_syncing_is_advisory_when_optimistic() {
        let mut engine = MockExecutionEngine::new();
        engine.set_payload_status(PayloadStatus::Syncing);

        assert!(engine.notify_new_payload(request(), true).await.is_ok());
        assert!(matches!(
            engine.notify_new_payload(request(), false).await,
            Err(EngineError::Syncing)
        ));
    }

    #[tokio::test]
    async fn test_mock_unavailable() {
        let mut engine = MockExecutionEngine::new();
        engine.set_unavailable(true);
        assert!(matches!(
            engine.notify_new_payload(request(), true).await,
            Err(EngineError::Unavailable(_))
        ));
    }
}
