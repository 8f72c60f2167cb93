use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use stf_bls::PubKey;
use tree_hash_derive::TreeHash;

use crate::{constants::FULL_EXIT_REQUEST_AMOUNT, misc::checksummed_address};

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct WithdrawalRequest {
    #[serde(with = "checksummed_address")]
    pub source_address: Address,
    pub validator_pubkey: PubKey,
    #[serde(with = "serde_utils::quoted_u64")]
    pub amount: u64,
}

impl WithdrawalRequest {
    pub fn is_full_exit_request(&self) -> bool {
        self.amount == FULL_EXIT_REQUEST_AMOUNT
    }
}
