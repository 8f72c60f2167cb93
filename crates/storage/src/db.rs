use std::{path::PathBuf, sync::Arc};

use redb::{Builder, Database};
use stf_consensus::beacon_state::BeaconState;
use tracing::info;

use crate::{
    deposit_store::RedbDepositStore,
    dir,
    errors::StoreError,
    tables::{
        Field, Table,
        beacon_state::{BEACON_STATE_TABLE, BeaconStateTable},
        deposit::{DEPOSIT_ROOT_TABLE, DEPOSIT_TABLE, DEPOSIT_TREE_FIELD, DepositTable},
        head_slot::{HEAD_SLOT_FIELD, HeadSlotField},
    },
};

pub const APP_NAME: &str = "stf";

pub const REDB_FILE: &str = "stf.redb";

/// The size of the cache for the database
///
/// 256 MiB
pub const REDB_CACHE_SIZE: usize = 256 * 1_024 * 1_024;

#[derive(Clone, Debug)]
pub struct StfDB {
    pub db: Arc<Database>,
}

#[allow(clippy::result_large_err)]
impl StfDB {
    pub fn new(data_dir: Option<PathBuf>, ephemeral: bool) -> Result<Self, StoreError> {
        let stf_dir = dir::setup_data_dir(APP_NAME, data_dir, ephemeral).map_err(StoreError::Io)?;

        let stf_file = stf_dir.join(REDB_FILE);
        info!(path = %stf_file.display(), "Opening state database");

        let db = Builder::new()
            .set_cache_size(REDB_CACHE_SIZE)
            .create(&stf_file)?;

        let write_txn = db.begin_write()?;
        write_txn.open_table(BEACON_STATE_TABLE)?;
        write_txn.open_table(DEPOSIT_TABLE)?;
        write_txn.open_table(DEPOSIT_ROOT_TABLE)?;
        write_txn.open_table(DEPOSIT_TREE_FIELD)?;
        write_txn.open_table(HEAD_SLOT_FIELD)?;
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    pub fn beacon_state_provider(&self) -> BeaconStateTable {
        BeaconStateTable {
            db: self.db.clone(),
        }
    }

    pub fn deposit_provider(&self) -> DepositTable {
        DepositTable {
            db: self.db.clone(),
        }
    }

    pub fn head_slot_provider(&self) -> HeadSlotField {
        HeadSlotField {
            db: self.db.clone(),
        }
    }

    pub fn deposit_store(&self) -> RedbDepositStore {
        RedbDepositStore::new(self.db.clone())
    }

    /// Store ``state`` under its slot and mark it as the head.
    pub fn persist_state(&self, state: BeaconState) -> Result<(), StoreError> {
        let slot = state.slot;
        self.beacon_state_provider().insert(slot, state)?;
        self.head_slot_provider().insert(slot)
    }

    /// The most recently persisted state, if any.
    pub fn head_state(&self) -> Result<Option<BeaconState>, StoreError> {
        match self.head_slot_provider().get() {
            Ok(slot) => self.beacon_state_provider().get(slot),
            Err(StoreError::FieldNotInitialized) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use stf_consensus::deposit::Deposit;
    use tempdir::TempDir;
    use tree_hash::TreeHash;

    use super::*;

    #[test]
    fn test_head_state_round_trips_through_disk() {
        let dir = TempDir::new("stf_db").unwrap();
        let db = StfDB::new(Some(dir.path().to_path_buf()), false).unwrap();
        assert!(db.head_state().unwrap().is_none());

        let mut state = BeaconState::default();
        state.slot = 7;
        state.eth1_deposit_index = 3;
        db.persist_state(state.clone()).unwrap();
        drop(db);

        let db = StfDB::new(Some(dir.path().to_path_buf()), false).unwrap();
        let loaded = db.head_state().unwrap().unwrap();
        assert_eq!(loaded.tree_hash_root(), state.tree_hash_root());
        assert!(db.beacon_state_provider().get(8).unwrap().is_none());
    }

    #[test]
    fn test_deposit_lookup_by_index() {
        let dir = TempDir::new("stf_db_deposits").unwrap();
        let db = StfDB::new(Some(dir.path().to_path_buf()), false).unwrap();
        let deposit = Deposit {
            pubkey: Default::default(),
            withdrawal_credentials: Default::default(),
            amount: 1,
            signature: Default::default(),
            index: 0,
        };
        db.deposit_provider().append(&[deposit.clone()]).unwrap();

        assert_eq!(db.deposit_provider().get(0).unwrap(), Some(deposit));
        assert_eq!(db.deposit_provider().next_index().unwrap(), 1);
    }
}
