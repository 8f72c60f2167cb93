use serde::{Deserialize, Serialize};
use stf_bls::PubKey;

/// A validator-set change reported to the consensus engine. An effective balance of zero
/// removes the validator from the active set.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    pub pubkey: PubKey,
    #[serde(with = "serde_utils::quoted_u64")]
    pub effective_balance: u64,
}

impl ValidatorUpdate {
    pub fn removal(pubkey: PubKey) -> Self {
        Self {
            pubkey,
            effective_balance: 0,
        }
    }

    pub fn is_removal(&self) -> bool {
        self.effective_balance == 0
    }
}
