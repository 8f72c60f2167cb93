pub mod engine_trait;
pub mod errors;
pub mod mock_engine;
pub mod new_payload_request;
pub mod rpc_types;
pub mod utils;

use std::{path::PathBuf, time::Duration};

use alloy_primitives::{B256, Bytes, hex};
use anyhow::anyhow;
use async_trait::async_trait;
use engine_trait::ExecutionApi;
use errors::EngineError;
use jsonwebtoken::{EncodingKey, Header, encode, get_current_timestamp};
use new_payload_request::NewPayloadRequest;
use reqwest::{Client, Request, Url};
use rpc_types::{
    execution_payload::ExecutionPayloadV3,
    payload_status::{PayloadStatus, PayloadStatusV1},
};
use serde_json::json;
use tracing::{debug, warn};
use utils::{Claims, JsonRpcRequest, JsonRpcResponse, strip_prefix};

/// Engine API client for the paired execution client.
#[derive(Clone)]
pub struct ExecutionEngine {
    http_client: Client,
    jwt_encoding_key: EncodingKey,
    engine_api_url: Url,
    request_timeout: Duration,
}

impl ExecutionEngine {
    pub fn new(
        engine_api_url: Url,
        jwt_path: PathBuf,
        request_timeout: Duration,
    ) -> anyhow::Result<ExecutionEngine> {
        let jwt_file = std::fs::read_to_string(jwt_path)?;
        let jwt_private_key = hex::decode(strip_prefix(jwt_file.trim_end()))?;
        Ok(ExecutionEngine {
            http_client: Client::new(),
            jwt_encoding_key: EncodingKey::from_secret(jwt_private_key.as_slice()),
            engine_api_url,
            request_timeout,
        })
    }

    pub fn create_jwt_token(&self) -> anyhow::Result<String> {
        let header = Header::default();
        let claims = Claims {
            iat: get_current_timestamp(),
            id: None,
            clv: None,
        };
        encode(&header, &claims, &self.jwt_encoding_key)
            .map_err(|err| anyhow!("Could not encode jwt key {err:?}"))
    }

    pub fn build_request(&self, rpc_request: JsonRpcRequest) -> anyhow::Result<Request> {
        Ok(self
            .http_client
            .post(self.engine_api_url.clone())
            .json(&rpc_request)
            .bearer_auth(self.create_jwt_token()?)
            .build()?)
    }

    pub async fn engine_new_payload_v4(
        &self,
        execution_payload: ExecutionPayloadV3,
        expected_blob_versioned_hashes: Vec<B256>,
        parent_beacon_block_root: B256,
        execution_requests: Vec<Bytes>,
    ) -> Result<PayloadStatusV1, EngineError> {
        let request_body = JsonRpcRequest {
            id: 1,
            jsonrpc: "2.0".to_string(),
            method: "engine_newPayloadV4".to_string(),
            params: vec![
                json!(execution_payload),
                json!(expected_blob_versioned_hashes),
                json!(parent_beacon_block_root),
                json!(execution_requests),
            ],
        };

        let http_post_request = self
            .build_request(request_body)
            .map_err(|err| EngineError::Rpc(err.to_string()))?;

        let response = tokio::time::timeout(
            self.request_timeout,
            self.http_client.execute(http_post_request),
        )
        .await
        .map_err(|_| EngineError::Timeout(self.request_timeout))??;

        response
            .json::<JsonRpcResponse<PayloadStatusV1>>()
            .await?
            .to_result()
            .map_err(|err| EngineError::Rpc(err.to_string()))
    }
}

#[async_trait]
impl ExecutionApi for ExecutionEngine {
    async fn notify_new_payload(
        &self,
        new_payload_request: NewPayloadRequest,
        retry_on_syncing: bool,
    ) -> Result<(), EngineError> {
        let NewPayloadRequest {
            execution_payload,
            versioned_hashes,
            parent_beacon_block_root,
            execution_requests,
        } = new_payload_request;
        let block_hash = execution_payload.block_hash;
        let payload_status = self
            .engine_new_payload_v4(
                execution_payload.into(),
                versioned_hashes,
                parent_beacon_block_root,
                execution_requests.to_requests_list(),
            )
            .await?;
        debug!(?block_hash, status = ?payload_status.status, "engine_newPayloadV4");
        resolve_payload_status(payload_status, retry_on_syncing)
    }
}

/// Map an Engine API payload status onto the outcome of a ``notify_new_payload`` call.
pub fn resolve_payload_status(
    payload_status: PayloadStatusV1,
    retry_on_syncing: bool,
) -> Result<(), EngineError> {
    let PayloadStatusV1 {
        status,
        validation_error,
        ..
    } = payload_status;
    match status {
        PayloadStatus::Syncing | PayloadStatus::Accepted if retry_on_syncing => {
            warn!(?status, "Execution client could not validate payload, continuing optimistically");
            Ok(())
        }
        status => match EngineError::from_status(status, validation_error) {
            Some(err) => Err(err),
            None => Ok(()),
        },
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tempdir::TempDir;

    use super::*;

    fn status(status: PayloadStatus) -> PayloadStatusV1 {
        PayloadStatusV1 {
            status,
            latest_valid_hash: None,
            validation_error: Some("reason".to_string()),
        }
    }

    #[rstest]
    #[case(PayloadStatus::Valid, false, true)]
    #[case(PayloadStatus::Syncing, true, true)]
    #[case(PayloadStatus::Accepted, true, true)]
    #[case(PayloadStatus::Syncing, false, false)]
    #[case(PayloadStatus::Accepted, false, false)]
    #[case(PayloadStatus::Invalid, true, false)]
    #[case(PayloadStatus::InvalidBlockHash, true, false)]
    fn test_resolve_payload_status(
        #[case] payload_status: PayloadStatus,
        #[case] retry_on_syncing: bool,
        #[case] ok: bool,
    ) {
        assert_eq!(
            resolve_payload_status(status(payload_status), retry_on_syncing).is_ok(),
            ok
        );
    }

    #[test]
    fn test_invalid_status_carries_reason() {
        let err = resolve_payload_status(status(PayloadStatus::Invalid), true).unwrap_err();
        assert!(matches!(err, EngineError::InvalidPayload(reason) if reason == "reason"));
    }

    #[test]
    fn test_engine_reads_jwt_secret() {
        let dir = TempDir::new("engine").unwrap();
        let jwt_path = dir.path().join("jwt.hex");
        std::fs::write(&jwt_path, format!("0x{}\n", "ab".repeat(32))).unwrap();

        let engine = ExecutionEngine::new(
            Url::parse("http://127.0.0.1:8551").unwrap(),
            jwt_path,
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(engine.create_jwt_token().unwrap().split('.').count(), 3);
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_not_an_invalid_payload() {
        let dir = TempDir::new("engine").unwrap();
        let jwt_path = dir.path().join("jwt.hex");
        std::fs::write(&jwt_path, "ab".repeat(32)).unwrap();

        let engine = ExecutionEngine::new(
            Url::parse("http://127.0.0.1:1").unwrap(),
            jwt_path,
            Duration::from_secs(5),
        )
        .unwrap();
        let err = engine
            .notify_new_payload(
                NewPayloadRequest {
                    execution_payload: Default::default(),
                    versioned_hashes: vec![],
                    parent_beacon_block_root: B256::ZERO,
                    execution_requests: Default::default(),
                },
                false,
            )
            .await
            .unwrap_err();
        assert!(!err.is_invalid_payload());
    }
}
