use alloy_primitives::B256;
use anyhow::{anyhow, ensure};
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{
    FixedVector, VariableList,
    serde_utils::{quoted_u64_fixed_vec, quoted_u64_var_list},
    typenum::{U8, U134217728, U1099511627776},
};
use tree_hash_derive::TreeHash;

use crate::{
    beacon_block_header::BeaconBlockHeader, eth_1_data::Eth1Data,
    execution_payload_header::ExecutionPayloadHeader, fork::Fork,
    pending_partial_withdrawal::PendingPartialWithdrawal, validator::Validator,
};

/// Ring buffer length of ``block_roots`` and ``state_roots``.
pub type SlotsPerHistoricalRoot = U8;
/// Ring buffer length of ``randao_mixes``.
pub type EpochsPerHistoricalVector = U8;
/// Ring buffer length of ``slashings``.
pub type EpochsPerSlashingsVector = U8;
pub type ValidatorRegistryLimit = U1099511627776;
pub type PendingPartialWithdrawalsLimit = U134217728;

#[derive(Debug, PartialEq, Eq, Clone, Default, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct BeaconState {
    // Versioning
    pub genesis_validators_root: B256,
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: u64,
    pub fork: Fork,

    // History
    pub latest_block_header: BeaconBlockHeader,
    pub block_roots: FixedVector<B256, SlotsPerHistoricalRoot>,
    pub state_roots: FixedVector<B256, SlotsPerHistoricalRoot>,

    // Eth1
    pub eth1_data: Eth1Data,
    /// Index of the next deposit expected from the deposit contract.
    #[serde(with = "serde_utils::quoted_u64")]
    pub eth1_deposit_index: u64,

    // Execution
    pub latest_execution_payload_header: ExecutionPayloadHeader,

    // Registry
    pub validators: VariableList<Validator, ValidatorRegistryLimit>,
    #[serde(with = "quoted_u64_var_list")]
    pub balances: VariableList<u64, ValidatorRegistryLimit>,

    // Randomness
    pub randao_mixes: FixedVector<B256, EpochsPerHistoricalVector>,

    // Withdrawals
    #[serde(with = "serde_utils::quoted_u64")]
    pub next_withdrawal_index: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub next_withdrawal_validator_index: u64,

    // Slashings
    #[serde(with = "quoted_u64_fixed_vec")]
    pub slashings: FixedVector<u64, EpochsPerSlashingsVector>,
    #[serde(with = "serde_utils::quoted_u64")]
    pub total_slashing: u64,

    // Electra
    pub pending_partial_withdrawals:
        VariableList<PendingPartialWithdrawal, PendingPartialWithdrawalsLimit>,
    #[serde(with = "serde_utils::quoted_u64")]
    pub earliest_exit_epoch: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub exit_balance_to_consume: u64,
}

impl BeaconState {
    pub fn get_index_for_new_validator(&self) -> u64 {
        self.validators.len() as u64
    }

    /// Increase the validator balance at index ``index`` by ``delta``.
    pub fn increase_balance(&mut self, index: u64, delta: u64) -> anyhow::Result<()> {
        let balance = self
            .balances
            .get_mut(index as usize)
            .ok_or_else(|| anyhow!("failed to increase balance of validator {index}"))?;
        *balance = balance
            .checked_add(delta)
            .ok_or_else(|| anyhow!("balance overflow for validator {index}"))?;
        Ok(())
    }

    /// Decrease the validator balance at index ``index`` by ``delta`` with underflow protection.
    pub fn decrease_balance(&mut self, index: u64, delta: u64) -> anyhow::Result<()> {
        let balance = self
            .balances
            .get_mut(index as usize)
            .ok_or_else(|| anyhow!("failed to decrease balance of validator {index}"))?;
        *balance = balance.saturating_sub(delta);
        Ok(())
    }

    /// Append ``validator`` with ``balance`` keeping the registry and balances aligned.
    pub fn add_validator(&mut self, validator: Validator, balance: u64) -> anyhow::Result<u64> {
        ensure!(
            self.validators.len() == self.balances.len(),
            "validator registry and balances are out of sync"
        );
        let index = self.get_index_for_new_validator();
        self.validators
            .push(validator)
            .map_err(|err| anyhow!("failed to push validator: {err:?}"))?;
        self.balances
            .push(balance)
            .map_err(|err| anyhow!("failed to push balance: {err:?}"))?;
        Ok(index)
    }

    pub fn get_pending_balance_to_withdraw(&self, validator_index: u64) -> u64 {
        self.pending_partial_withdrawals
            .iter()
            .filter(|withdrawal| withdrawal.validator_index == validator_index)
            .map(|withdrawal| withdrawal.amount)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use stf_bls::PubKey;

    use super::*;
    use crate::constants::FAR_FUTURE_EPOCH;

    fn validator(activation_epoch: u64, exit_epoch: u64) -> Validator {
        Validator {
            pubkey: PubKey::default(),
            withdrawal_credentials: B256::ZERO,
            effective_balance: 0,
            slashed: false,
            activation_eligibility_epoch: 0,
            activation_epoch,
            exit_epoch,
            withdrawable_epoch: FAR_FUTURE_EPOCH,
        }
    }

    #[test]
    fn test_default_state_rings_are_full() {
        let state = BeaconState::default();
        assert_eq!(state.block_roots.len(), 8);
        assert_eq!(state.state_roots.len(), 8);
        assert_eq!(state.randao_mixes.len(), 8);
        assert!(state.block_roots.iter().all(|root| root.is_zero()));
    }

    #[test]
    fn test_balance_updates() {
        let mut state = BeaconState::default();
        let index = state.add_validator(validator(0, FAR_FUTURE_EPOCH), 10).unwrap();

        state.increase_balance(index, 5).unwrap();
        assert_eq!(state.balances[0], 15);
        state.decrease_balance(index, 20).unwrap();
        assert_eq!(state.balances[0], 0);
        assert!(state.increase_balance(1, 1).is_err());
    }
}
