use std::sync::Arc;

use alloy_primitives::B256;
use redb::{Database, Durability, ReadableTable, TableDefinition};
use stf_consensus::deposit::Deposit;
use tree_hash::TreeHash;

use super::{SSZEncoding, Table};
use crate::{deposit_tree::DepositTree, errors::StoreError};

/// Table definition for the Deposit table
///
/// Key: deposit contract index
/// Value: Deposit
pub const DEPOSIT_TABLE: TableDefinition<u64, SSZEncoding<Deposit>> =
    TableDefinition::new("deposit");

/// Table definition for the Deposit_Root table
///
/// Key: number of deposits covered
/// Value: hash tree root of the first ``key`` deposits
pub const DEPOSIT_ROOT_TABLE: TableDefinition<u64, SSZEncoding<B256>> =
    TableDefinition::new("deposit_root");

/// Table definition for the Deposit_Tree table
///
/// Value: incremental merkle tree over every stored deposit
pub const DEPOSIT_TREE_FIELD: TableDefinition<&str, SSZEncoding<DepositTree>> =
    TableDefinition::new("deposit_tree");

pub const DEPOSIT_TREE_KEY: &str = "deposit_tree_key";

pub struct DepositTable {
    pub db: Arc<Database>,
}

impl DepositTable {
    /// Index the next appended deposit must carry.
    pub fn next_index(&self) -> Result<u64, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DEPOSIT_TABLE)?;
        Ok(table.last()?.map_or(0, |(key, _)| key.value() + 1))
    }

    /// Deposits with index in ``[start, end)``, stopping at the first missing index.
    pub fn range(&self, start: u64, end: u64) -> Result<Vec<Deposit>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DEPOSIT_TABLE)?;

        let mut deposits = vec![];
        for (expected, entry) in (start..end).zip(table.range(start..end)?) {
            let (key, value) = entry?;
            if key.value() != expected {
                break;
            }
            deposits.push(value.value());
        }
        Ok(deposits)
    }

    /// Hash tree root of the first ``count`` deposits.
    pub fn root_at(&self, count: u64) -> Result<B256, StoreError> {
        if count == 0 {
            return Ok(DepositTree::default().root());
        }
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DEPOSIT_ROOT_TABLE)?;
        let root = table
            .get(count)?
            .ok_or(StoreError::DepositNotFound(count - 1))?;
        Ok(root.value())
    }

    /// Append ``deposits`` in one transaction, recording the deposit root after each one. The
    /// batch must continue the stored sequence without gaps.
    pub fn append(&self, deposits: &[Deposit]) -> Result<(), StoreError> {
        let mut write_txn = self.db.begin_write()?;
        write_txn.set_durability(Durability::Immediate);
        let mut table = write_txn.open_table(DEPOSIT_TABLE)?;
        let mut roots = write_txn.open_table(DEPOSIT_ROOT_TABLE)?;
        let mut tree_field = write_txn.open_table(DEPOSIT_TREE_FIELD)?;
        let mut tree = tree_field
            .get(DEPOSIT_TREE_KEY)?
            .map(|tree| tree.value())
            .unwrap_or_default();

        let mut expected = table.last()?.map_or(0, |(key, _)| key.value() + 1);
        for deposit in deposits {
            if deposit.index != expected {
                return Err(StoreError::DepositIndexGap {
                    expected,
                    actual: deposit.index,
                });
            }
            table.insert(deposit.index, deposit.clone())?;
            tree.push(deposit.tree_hash_root())?;
            roots.insert(tree.count, tree.root())?;
            expected += 1;
        }
        tree_field.insert(DEPOSIT_TREE_KEY, tree)?;
        drop(table);
        drop(roots);
        drop(tree_field);
        write_txn.commit()?;
        Ok(())
    }
}

impl Table for DepositTable {
    type Key = u64;

    type Value = Deposit;

    fn get(&self, key: Self::Key) -> Result<Option<Self::Value>, StoreError> {
        let read_txn = self.db.begin_read()?;

        let table = read_txn.open_table(DEPOSIT_TABLE)?;
        let result = table.get(key)?;
        Ok(result.map(|res| res.value()))
    }

    fn insert(&self, key: Self::Key, value: Self::Value) -> Result<(), StoreError> {
        let mut write_txn = self.db.begin_write()?;
        write_txn.set_durability(Durability::Immediate);
        let mut table = write_txn.open_table(DEPOSIT_TABLE)?;
        table.insert(key, value)?;
        drop(table);
        write_txn.commit()?;
        Ok(())
    }
}
