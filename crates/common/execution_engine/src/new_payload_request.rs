use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use stf_consensus::{
    beacon_block::BeaconBlock, execution_payload::ExecutionPayload,
    execution_requests::ExecutionRequests,
};

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct NewPayloadRequest {
    pub execution_payload: ExecutionPayload,
    pub versioned_hashes: Vec<B256>,
    pub parent_beacon_block_root: B256,
    pub execution_requests: ExecutionRequests,
}

impl NewPayloadRequest {
    pub fn from_block(block: &BeaconBlock) -> Self {
        Self {
            execution_payload: block.body.execution_payload.clone(),
            versioned_hashes: block
                .body
                .blob_kzg_commitments
                .iter()
                .map(|commitment| commitment.calculate_versioned_hash())
                .collect(),
            parent_beacon_block_root: block.parent_root,
            execution_requests: block.body.execution_requests.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use stf_consensus::{beacon_block::BeaconBlockBody, kzg_commitment::KZGCommitment};

    use super::*;

    #[test]
    fn test_from_block_derives_versioned_hashes() {
        let mut body = BeaconBlockBody::default();
        body.blob_kzg_commitments
            .push(KZGCommitment::default())
            .unwrap();
        let block = BeaconBlock {
            slot: 1,
            proposer_index: 0,
            parent_root: B256::repeat_byte(5),
            state_root: B256::ZERO,
            body,
        };

        let request = NewPayloadRequest::from_block(&block);
        assert_eq!(request.parent_beacon_block_root, B256::repeat_byte(5));
        assert_eq!(request.versioned_hashes.len(), 1);
        assert_eq!(request.versioned_hashes[0][0], 0x01);
    }
}
