use alloy_primitives::{B256, aliases::B32};
use stf_consensus::{
    beacon_block::BeaconBlockBody,
    beacon_block_header::BeaconBlockHeader,
    constants::{GENESIS_EPOCH, GENESIS_SLOT},
    deposit::{Deposit, compute_deposits_root},
    eth_1_data::Eth1Data,
    execution_payload_header::ExecutionPayloadHeader,
    fork::Fork,
    validator_update::ValidatorUpdate,
};
use tracing::info;
use tree_hash::TreeHash;

use crate::{
    error::StateTransitionError, processor::StateProcessor, state_db::StateDB,
    validators::validator_set_diff,
};

impl StateProcessor {
    /// Build the genesis state from the genesis deposits and execution payload header.
    ///
    /// Genesis deposits are trusted and applied without signature checks. Returns the state and
    /// the initial validator set.
    pub fn initialize_beacon_state_from_eth1(
        &self,
        deposits: &[Deposit],
        execution_payload_header: ExecutionPayloadHeader,
        genesis_version: B32,
    ) -> Result<(StateDB, Vec<ValidatorUpdate>), StateTransitionError> {
        self.validate_genesis_deposits(deposits)?;

        let mut st = StateDB::default();
        st.set_slot(GENESIS_SLOT);
        st.set_fork(Fork {
            previous_version: genesis_version,
            current_version: genesis_version,
            epoch: GENESIS_EPOCH,
        });
        st.set_eth1_data(Eth1Data {
            deposit_root: compute_deposits_root(deposits)?,
            deposit_count: 0,
            block_hash: B256::ZERO,
        });
        st.set_latest_block_header(BeaconBlockHeader {
            body_root: BeaconBlockBody::default().tree_hash_root(),
            ..Default::default()
        });

        // Seed RANDAO with the genesis execution block hash
        for index in 0..self.chain_spec.epochs_per_historical_vector {
            st.update_randao_mix_at_index(index, execution_payload_header.block_hash)?;
        }

        for deposit in deposits {
            st.set_eth1_deposit_index(deposit.index + 1);
            match st.validator_index_by_pubkey(&deposit.pubkey) {
                Some(index) => st.increase_balance(index, deposit.amount)?,
                None => self.add_validator_to_registry(&mut st, deposit)?,
            }
        }

        st.set_latest_execution_payload_header(execution_payload_header);
        st.set_genesis_validators_root(st.state().validators.tree_hash_root());

        // Process genesis activations
        let min_activation_balance = self.chain_spec.min_activation_balance();
        for index in 0..st.total_validators() {
            let mut validator = st.validator_by_index(index)?.clone();
            if validator.effective_balance >= min_activation_balance {
                validator.activation_eligibility_epoch = GENESIS_EPOCH;
                validator.activation_epoch = GENESIS_EPOCH;
                st.update_validator_at_index(index, validator)?;
            }
        }

        let validator_updates =
            validator_set_diff(&[], &self.active_validators(&st, GENESIS_EPOCH));
        info!(
            validators = st.total_validators(),
            active = validator_updates.len(),
            genesis_validators_root = %st.genesis_validators_root(),
            "Initialized genesis state"
        );
        Ok((st, validator_updates))
    }

    fn validate_genesis_deposits(&self, deposits: &[Deposit]) -> Result<(), StateTransitionError> {
        if deposits.is_empty() {
            return Err(StateTransitionError::NoGenesisDeposits);
        }

        let cap = self.chain_spec.validator_set_cap;
        if deposits.len() as u64 > cap {
            return Err(StateTransitionError::GenesisDepositsExceedCap {
                cap,
                actual: deposits.len() as u64,
            });
        }

        for (expected, deposit) in deposits.iter().enumerate() {
            if deposit.index != expected as u64 {
                return Err(StateTransitionError::GenesisDepositIndexOutOfOrder {
                    expected: expected as u64,
                    actual: deposit.index,
                });
            }
        }
        Ok(())
    }
}
