use alloy_primitives::{Address, B256, Bytes, U64, U256};
use serde::{Deserialize, Serialize};
use stf_consensus::{execution_payload::ExecutionPayload, withdrawal::Withdrawal};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalV1 {
    pub index: U64,
    pub validator_index: U64,
    pub address: Address,
    pub amount: U64,
}

impl From<Withdrawal> for WithdrawalV1 {
    fn from(withdrawal: Withdrawal) -> Self {
        let Withdrawal {
            index,
            validator_index,
            address,
            amount,
        } = withdrawal;

        Self {
            index: U64::from(index),
            validator_index: U64::from(validator_index),
            address,
            amount: U64::from(amount),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPayloadV3 {
    pub parent_hash: B256,
    pub fee_recipient: Address,
    pub state_root: B256,
    pub receipts_root: B256,
    pub logs_bloom: Bytes,
    pub prev_randao: B256,
    pub block_number: U64,
    pub gas_limit: U64,
    pub gas_used: U64,
    pub timestamp: U64,
    pub extra_data: Bytes,
    pub base_fee_per_gas: U256,
    pub block_hash: B256,
    pub transactions: Vec<Bytes>,
    pub withdrawals: Vec<WithdrawalV1>,
    pub blob_gas_used: U64,
    pub excess_blob_gas: U64,
}

impl From<ExecutionPayload> for ExecutionPayloadV3 {
    fn from(payload: ExecutionPayload) -> Self {
        let ExecutionPayload {
            parent_hash,
            fee_recipient,
            state_root,
            receipts_root,
            logs_bloom,
            prev_randao,
            block_number,
            gas_limit,
            gas_used,
            timestamp,
            extra_data,
            base_fee_per_gas,
            block_hash,
            transactions,
            withdrawals,
            blob_gas_used,
            excess_blob_gas,
        } = payload;

        Self {
            parent_hash,
            fee_recipient,
            state_root,
            receipts_root,
            logs_bloom: Bytes::from(logs_bloom.to_vec()),
            prev_randao,
            block_number: U64::from(block_number),
            gas_limit: U64::from(gas_limit),
            gas_used: U64::from(gas_used),
            timestamp: U64::from(timestamp),
            extra_data: Bytes::from(extra_data.to_vec()),
            base_fee_per_gas,
            block_hash,
            transactions: transactions
                .into_iter()
                .map(|transaction| Bytes::from(transaction.to_vec()))
                .collect(),
            withdrawals: withdrawals.into_iter().map(Into::into).collect(),
            blob_gas_used: U64::from(blob_gas_used),
            excess_blob_gas: U64::from(excess_blob_gas),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantities_serialize_as_hex() {
        let payload = ExecutionPayload {
            block_number: 16,
            timestamp: 255,
            ..Default::default()
        };
        let json = serde_json::to_value(ExecutionPayloadV3::from(payload)).unwrap();
        assert_eq!(json["blockNumber"], "0x10");
        assert_eq!(json["timestamp"], "0xff");
        assert_eq!(json["logsBloom"].as_str().unwrap().len(), 2 + 512);
    }
}
