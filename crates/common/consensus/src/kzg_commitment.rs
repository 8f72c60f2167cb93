use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use ssz_derive::{Decode, Encode};
use ssz_types::{FixedVector, serde_utils::hex_fixed_vec, typenum::U48};
use tree_hash_derive::TreeHash;

use crate::constants::VERSIONED_HASH_VERSION_KZG;

#[derive(Debug, PartialEq, Eq, Clone, Default, Serialize, Deserialize, Encode, Decode, TreeHash)]
#[serde(transparent)]
pub struct KZGCommitment {
    #[serde(with = "hex_fixed_vec")]
    pub inner: FixedVector<u8, U48>,
}

impl KZGCommitment {
    pub fn calculate_versioned_hash(&self) -> B256 {
        let mut versioned_hash = Sha256::digest(&self.inner[..]);
        versioned_hash[0] = VERSIONED_HASH_VERSION_KZG;
        B256::from_slice(&versioned_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versioned_hash_prefix() {
        let commitment = KZGCommitment {
            inner: FixedVector::from(vec![0xc0; 48]),
        };
        let hash = commitment.calculate_versioned_hash();
        let digest = Sha256::digest([0xc0u8; 48]);

        assert_eq!(hash[0], VERSIONED_HASH_VERSION_KZG);
        assert_eq!(&hash[1..], &digest[1..]);
    }
}
