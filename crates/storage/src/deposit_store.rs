use std::sync::Arc;

use alloy_primitives::B256;
use parking_lot::RwLock;
use redb::Database;
use stf_consensus::deposit::Deposit;
use tree_hash::TreeHash;

use crate::{deposit_tree::DepositTree, errors::StoreError, tables::deposit::DepositTable};

/// Append-only mirror of the deposit contract, addressed by contiguous deposit index.
#[allow(clippy::result_large_err)]
pub trait DepositStore: Send + Sync {
    /// Up to ``count`` deposits starting at ``start``, in index order, together with the hash
    /// tree root of every stored deposit below the returned range's upper bound.
    fn get_deposits_by_index(
        &self,
        start: u64,
        count: u64,
    ) -> Result<(Vec<Deposit>, B256), StoreError>;

    /// Append deposits. The first must carry the next expected index and the rest must follow
    /// it without gaps.
    fn enqueue_deposits(&self, deposits: &[Deposit]) -> Result<(), StoreError>;

    /// Number of deposits stored, which is also the next expected index.
    fn deposit_count(&self) -> Result<u64, StoreError>;
}

pub struct RedbDepositStore {
    table: DepositTable,
}

impl RedbDepositStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            table: DepositTable { db },
        }
    }
}

impl DepositStore for RedbDepositStore {
    fn get_deposits_by_index(
        &self,
        start: u64,
        count: u64,
    ) -> Result<(Vec<Deposit>, B256), StoreError> {
        let bound = self.table.next_index()?.min(start.saturating_add(count));
        let deposits = if start < bound {
            self.table.range(start, bound)?
        } else {
            vec![]
        };
        let found = start + deposits.len() as u64;
        if found < bound {
            return Err(StoreError::DepositNotFound(found));
        }
        Ok((deposits, self.table.root_at(bound)?))
    }

    fn enqueue_deposits(&self, deposits: &[Deposit]) -> Result<(), StoreError> {
        self.table.append(deposits)
    }

    fn deposit_count(&self) -> Result<u64, StoreError> {
        self.table.next_index()
    }
}

#[derive(Default)]
struct StoredDeposits {
    deposits: Vec<Deposit>,
    tree: DepositTree,
    /// ``roots[n]`` is the root of the first ``n + 1`` deposits.
    roots: Vec<B256>,
}

#[derive(Default)]
pub struct InMemoryDepositStore {
    stored: RwLock<StoredDeposits>,
}

impl InMemoryDepositStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DepositStore for InMemoryDepositStore {
    fn get_deposits_by_index(
        &self,
        start: u64,
        count: u64,
    ) -> Result<(Vec<Deposit>, B256), StoreError> {
        let stored = self.stored.read();
        let bound = (stored.deposits.len() as u64).min(start.saturating_add(count)) as usize;
        let root = match bound.checked_sub(1) {
            Some(last) => stored.roots[last],
            None => DepositTree::default().root(),
        };
        let deposits = stored
            .deposits
            .get(start as usize..bound)
            .map(<[Deposit]>::to_vec)
            .unwrap_or_default();
        Ok((deposits, root))
    }

    fn enqueue_deposits(&self, deposits: &[Deposit]) -> Result<(), StoreError> {
        let mut stored = self.stored.write();
        let mut expected = stored.deposits.len() as u64;
        for deposit in deposits {
            if deposit.index != expected {
                return Err(StoreError::DepositIndexGap {
                    expected,
                    actual: deposit.index,
                });
            }
            expected += 1;
        }

        let StoredDeposits {
            deposits: stored_deposits,
            tree,
            roots,
        } = &mut *stored;
        for deposit in deposits {
            tree.push(deposit.tree_hash_root())?;
            roots.push(tree.root());
            stored_deposits.push(deposit.clone());
        }
        Ok(())
    }

    fn deposit_count(&self) -> Result<u64, StoreError> {
        Ok(self.stored.read().deposits.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use stf_bls::{BLSSignature, PubKey};
    use stf_consensus::deposit::compute_deposits_root;
    use tempdir::TempDir;

    use super::*;
    use crate::db::StfDB;

    fn deposit(index: u64) -> Deposit {
        Deposit {
            pubkey: PubKey::default(),
            withdrawal_credentials: B256::with_last_byte(index as u8),
            amount: 10_000_000_000_000,
            signature: BLSSignature::default(),
            index,
        }
    }

    fn redb_store(dir: &TempDir) -> RedbDepositStore {
        StfDB::new(Some(dir.path().to_path_buf()), false)
            .unwrap()
            .deposit_store()
    }

    fn check_store(store: &dyn DepositStore) {
        store
            .enqueue_deposits(&[deposit(0), deposit(1), deposit(2)])
            .unwrap();
        assert_eq!(store.deposit_count().unwrap(), 3);

        let (deposits, root) = store.get_deposits_by_index(1, 5).unwrap();
        assert_eq!(deposits, vec![deposit(1), deposit(2)]);
        assert_eq!(
            root,
            compute_deposits_root(&[deposit(0), deposit(1), deposit(2)]).unwrap()
        );

        let (deposits, root) = store.get_deposits_by_index(0, 1).unwrap();
        assert_eq!(deposits, vec![deposit(0)]);
        assert_eq!(root, compute_deposits_root(&[deposit(0)]).unwrap());

        let (deposits, _) = store.get_deposits_by_index(3, 2).unwrap();
        assert!(deposits.is_empty());

        let (deposits, root) = store.get_deposits_by_index(0, 0).unwrap();
        assert!(deposits.is_empty());
        assert_eq!(root, compute_deposits_root(&[]).unwrap());
    }

    fn check_gap_rejected(store: &dyn DepositStore) {
        store.enqueue_deposits(&[deposit(0)]).unwrap();
        let err = store.enqueue_deposits(&[deposit(2)]).unwrap_err();
        assert!(matches!(
            err,
            StoreError::DepositIndexGap {
                expected: 1,
                actual: 2
            }
        ));

        let err = store
            .enqueue_deposits(&[deposit(1), deposit(3)])
            .unwrap_err();
        assert!(matches!(err, StoreError::DepositIndexGap { .. }));
        assert_eq!(store.deposit_count().unwrap(), 1);
    }

    #[test]
    fn test_in_memory_store() {
        check_store(&InMemoryDepositStore::new());
        check_gap_rejected(&InMemoryDepositStore::new());
    }

    #[test]
    fn test_redb_store() {
        let dir = TempDir::new("deposit_store").unwrap();
        check_store(&redb_store(&dir));
    }

    #[test]
    fn test_redb_store_rejects_gaps() {
        let dir = TempDir::new("deposit_store_gap").unwrap();
        check_gap_rejected(&redb_store(&dir));
    }

    #[test]
    fn test_redb_roots_survive_reopen() {
        let dir = TempDir::new("deposit_store_reopen").unwrap();
        let batch: Vec<_> = (0..5).map(deposit).collect();
        redb_store(&dir).enqueue_deposits(&batch[..3]).unwrap();

        // The tree picks up where the previous handle left off
        let store = redb_store(&dir);
        store.enqueue_deposits(&batch[3..]).unwrap();
        for bound in 1..=5 {
            let (_, root) = store.get_deposits_by_index(bound - 1, 1).unwrap();
            assert_eq!(root, compute_deposits_root(&batch[..bound as usize]).unwrap());
        }
    }

    #[test]
    fn test_stores_agree_on_root() {
        let dir = TempDir::new("deposit_store_root").unwrap();
        let redb = redb_store(&dir);
        let memory = InMemoryDepositStore::new();
        let batch: Vec<_> = (0..4).map(deposit).collect();
        redb.enqueue_deposits(&batch).unwrap();
        memory.enqueue_deposits(&batch).unwrap();

        assert_eq!(
            redb.get_deposits_by_index(2, 2).unwrap(),
            memory.get_deposits_by_index(2, 2).unwrap()
        );
    }
}
