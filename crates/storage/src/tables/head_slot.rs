use std::sync::Arc;

use redb::{Database, Durability, TableDefinition};

use super::Field;
use crate::errors::StoreError;

/// Table definition for the Head_Slot table
///
/// Value: slot of the most recently persisted beacon state
pub const HEAD_SLOT_FIELD: TableDefinition<&str, u64> = TableDefinition::new("head_slot");

pub const HEAD_SLOT_KEY: &str = "head_slot_key";

pub struct HeadSlotField {
    pub db: Arc<Database>,
}

impl Field for HeadSlotField {
    type Value = u64;

    fn get(&self) -> Result<u64, StoreError> {
        let read_txn = self.db.begin_read()?;

        let table = read_txn.open_table(HEAD_SLOT_FIELD)?;
        let result = table
            .get(HEAD_SLOT_KEY)?
            .ok_or(StoreError::FieldNotInitialized)?;
        Ok(result.value())
    }

    fn insert(&self, value: Self::Value) -> Result<(), StoreError> {
        let mut write_txn = self.db.begin_write()?;
        write_txn.set_durability(Durability::Immediate);
        let mut table = write_txn.open_table(HEAD_SLOT_FIELD)?;
        table.insert(HEAD_SLOT_KEY, value)?;
        drop(table);
        write_txn.commit()?;
        Ok(())
    }
}
