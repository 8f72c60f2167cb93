use std::sync::LazyLock;

use alloy_primitives::B256;
use ssz_derive::{Decode, Encode};

use crate::errors::StoreError;

/// Depth of the deposit contract tree, ``log2(DepositContractLimit)``.
pub const DEPOSIT_TREE_DEPTH: usize = 32;

static ZERO_HASHES: LazyLock<[B256; DEPOSIT_TREE_DEPTH]> = LazyLock::new(|| {
    let mut hashes = [B256::ZERO; DEPOSIT_TREE_DEPTH];
    for height in 1..DEPOSIT_TREE_DEPTH {
        hashes[height] = hash_concat(hashes[height - 1], hashes[height - 1]);
    }
    hashes
});

fn hash_concat(left: B256, right: B256) -> B256 {
    ethereum_hashing::hash32_concat(left.as_slice(), right.as_slice()).into()
}

/// Incremental merkle tree over deposit roots.
///
/// Keeps one node per level, so appending a deposit and reading the root of every deposit
/// pushed so far costs ``DEPOSIT_TREE_DEPTH`` hashes. The root equals the hash tree root of the
/// ``List[Deposit, DepositContractLimit]`` holding the same deposits.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct DepositTree {
    pub branch: Vec<B256>,
    pub count: u64,
}

impl Default for DepositTree {
    fn default() -> Self {
        Self {
            branch: vec![B256::ZERO; DEPOSIT_TREE_DEPTH],
            count: 0,
        }
    }
}

impl DepositTree {
    #[allow(clippy::result_large_err)]
    pub fn push(&mut self, leaf: B256) -> Result<(), StoreError> {
        if self.branch.len() != DEPOSIT_TREE_DEPTH || self.count >= 1 << DEPOSIT_TREE_DEPTH {
            return Err(StoreError::DepositTreeFull(self.count));
        }

        self.count += 1;
        let mut node = leaf;
        let mut size = self.count;
        for height in 0..DEPOSIT_TREE_DEPTH {
            if size & 1 == 1 {
                self.branch[height] = node;
                return Ok(());
            }
            node = hash_concat(self.branch[height], node);
            size >>= 1;
        }
        Ok(())
    }

    pub fn root(&self) -> B256 {
        let mut node = B256::ZERO;
        let mut size = self.count;
        for (height, zero_hash) in ZERO_HASHES.iter().enumerate() {
            node = if size & 1 == 1 {
                hash_concat(self.branch[height], node)
            } else {
                hash_concat(node, *zero_hash)
            };
            size >>= 1;
        }

        let mut length = B256::ZERO;
        length[..8].copy_from_slice(&self.count.to_le_bytes());
        hash_concat(node, length)
    }
}

#[cfg(test)]
mod tests {
    use stf_bls::{BLSSignature, PubKey};
    use stf_consensus::deposit::{Deposit, compute_deposits_root};
    use tree_hash::TreeHash;

    use super::*;

    fn deposit(index: u64) -> Deposit {
        Deposit {
            pubkey: PubKey::default(),
            withdrawal_credentials: B256::with_last_byte(index as u8),
            amount: 10_000_000_000_000 + index,
            signature: BLSSignature::default(),
            index,
        }
    }

    #[test]
    fn test_root_matches_list_hash_tree_root() {
        let deposits = (0..9).map(deposit).collect::<Vec<_>>();
        let mut tree = DepositTree::default();
        assert_eq!(tree.root(), compute_deposits_root(&[]).unwrap());

        for (count, deposit) in deposits.iter().enumerate() {
            tree.push(deposit.tree_hash_root()).unwrap();
            assert_eq!(
                tree.root(),
                compute_deposits_root(&deposits[..=count]).unwrap()
            );
        }
    }
}
