use alloy_primitives::Bytes;
use serde::{Deserialize, Serialize};
use ssz::Encode;
use ssz_derive::{Decode, Encode};
use ssz_types::{
    VariableList,
    typenum::{U2, U16, U8192},
};
use tree_hash_derive::TreeHash;

use crate::{
    consolidation_request::ConsolidationRequest,
    constants::{CONSOLIDATION_REQUEST_TYPE, DEPOSIT_REQUEST_TYPE, WITHDRAWAL_REQUEST_TYPE},
    deposit_request::DepositRequest,
    withdrawal_request::WithdrawalRequest,
};

#[derive(
    Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash, Default,
)]
pub struct ExecutionRequests {
    pub deposits: VariableList<DepositRequest, U8192>,
    pub withdrawals: VariableList<WithdrawalRequest, U16>,
    pub consolidations: VariableList<ConsolidationRequest, U2>,
}

impl ExecutionRequests {
    pub fn is_empty(&self) -> bool {
        self.deposits.is_empty() && self.withdrawals.is_empty() && self.consolidations.is_empty()
    }

    /// Encode as the typed request list sent with ``engine_newPayloadV4``. Empty request
    /// types are omitted.
    pub fn to_requests_list(&self) -> Vec<Bytes> {
        let mut requests_list = vec![];
        for (request_type, encoded) in [
            (DEPOSIT_REQUEST_TYPE, self.deposits.as_ssz_bytes()),
            (WITHDRAWAL_REQUEST_TYPE, self.withdrawals.as_ssz_bytes()),
            (CONSOLIDATION_REQUEST_TYPE, self.consolidations.as_ssz_bytes()),
        ] {
            if !encoded.is_empty() {
                requests_list.push(Bytes::from([vec![request_type], encoded].concat()));
            }
        }
        requests_list
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::Address;
    use stf_bls::PubKey;

    use super::*;

    #[test]
    fn test_requests_list_skips_empty_types() {
        let mut requests = ExecutionRequests::default();
        assert!(requests.is_empty());
        assert!(requests.to_requests_list().is_empty());

        requests
            .withdrawals
            .push(WithdrawalRequest {
                source_address: Address::ZERO,
                validator_pubkey: PubKey::default(),
                amount: 0,
            })
            .unwrap();

        let list = requests.to_requests_list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0][0], WITHDRAWAL_REQUEST_TYPE);
        assert_eq!(list[0].len(), 1 + 20 + 48 + 8);
    }
}
