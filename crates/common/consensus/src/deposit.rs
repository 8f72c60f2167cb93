use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{VariableList, typenum::U4294967296};
use stf_bls::{BLSSignature, PubKey};
use tree_hash::TreeHash;
use tree_hash_derive::TreeHash;

use crate::deposit_message::DepositMessage;

/// Upper bound of the deposit contract's tree, used when hashing a deposit list.
pub type DepositContractLimit = U4294967296;

/// A deposit as emitted by the deposit contract. Its ``index`` is global and contiguous from 0.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct Deposit {
    pub pubkey: PubKey,
    pub withdrawal_credentials: B256,
    #[serde(with = "serde_utils::quoted_u64")]
    pub amount: u64,
    pub signature: BLSSignature,
    #[serde(with = "serde_utils::quoted_u64")]
    pub index: u64,
}

impl Deposit {
    pub fn message(&self) -> DepositMessage {
        DepositMessage {
            pubkey: self.pubkey.clone(),
            withdrawal_credentials: self.withdrawal_credentials,
            amount: self.amount,
        }
    }
}

/// Hash tree root of a deposit list, as committed to in ``Eth1Data.deposit_root``.
pub fn compute_deposits_root(deposits: &[Deposit]) -> anyhow::Result<B256> {
    let list = VariableList::<Deposit, DepositContractLimit>::new(deposits.to_vec())
        .map_err(|err| anyhow::anyhow!("deposit list exceeds contract limit: {err:?}"))?;
    Ok(list.tree_hash_root())
}
