use std::collections::HashMap;

use alloy_primitives::B256;
use anyhow::anyhow;
use ssz_types::VariableList;
use stf_bls::PubKey;
use stf_consensus::{
    beacon_block_header::BeaconBlockHeader, beacon_state::BeaconState, eth_1_data::Eth1Data,
    execution_payload_header::ExecutionPayloadHeader, fork::Fork,
    pending_partial_withdrawal::PendingPartialWithdrawal, validator::Validator,
};
use tree_hash::TreeHash;

use crate::error::StateTransitionError;

fn out_of_range(what: &str, index: u64) -> StateTransitionError {
    anyhow!("{what} index {index} out of range").into()
}

/// Mutable view over a [`BeaconState`] that keeps a pubkey to validator index lookup in step
/// with the registry.
///
/// Cloning produces an independent snapshot. The processor mutates a clone and only hands it
/// back once the whole transition succeeded.
#[derive(Debug, Clone, Default)]
pub struct StateDB {
    state: BeaconState,
    pubkey_index: HashMap<PubKey, u64>,
}

impl TryFrom<BeaconState> for StateDB {
    type Error = StateTransitionError;

    /// Rejects a registry that lists the same pubkey twice.
    fn try_from(state: BeaconState) -> Result<Self, Self::Error> {
        let mut pubkey_index = HashMap::with_capacity(state.validators.len());
        for (index, validator) in state.validators.iter().enumerate() {
            if let Some(existing) = pubkey_index.insert(validator.pubkey.clone(), index as u64) {
                return Err(anyhow!(
                    "validators {existing} and {index} share pubkey {:?}",
                    validator.pubkey
                )
                .into());
            }
        }
        Ok(Self {
            state,
            pubkey_index,
        })
    }
}

impl StateDB {
    pub fn state(&self) -> &BeaconState {
        &self.state
    }

    pub fn into_state(self) -> BeaconState {
        self.state
    }

    pub fn hash_tree_root(&self) -> B256 {
        self.state.tree_hash_root()
    }

    pub fn slot(&self) -> u64 {
        self.state.slot
    }

    pub fn set_slot(&mut self, slot: u64) {
        self.state.slot = slot;
    }

    pub fn fork(&self) -> Fork {
        self.state.fork
    }

    pub fn set_fork(&mut self, fork: Fork) {
        self.state.fork = fork;
    }

    pub fn genesis_validators_root(&self) -> B256 {
        self.state.genesis_validators_root
    }

    pub fn set_genesis_validators_root(&mut self, root: B256) {
        self.state.genesis_validators_root = root;
    }

    pub fn latest_block_header(&self) -> &BeaconBlockHeader {
        &self.state.latest_block_header
    }

    pub fn set_latest_block_header(&mut self, header: BeaconBlockHeader) {
        self.state.latest_block_header = header;
    }

    pub fn eth1_data(&self) -> &Eth1Data {
        &self.state.eth1_data
    }

    pub fn set_eth1_data(&mut self, eth1_data: Eth1Data) {
        self.state.eth1_data = eth1_data;
    }

    pub fn eth1_deposit_index(&self) -> u64 {
        self.state.eth1_deposit_index
    }

    pub fn set_eth1_deposit_index(&mut self, index: u64) {
        self.state.eth1_deposit_index = index;
    }

    pub fn latest_execution_payload_header(&self) -> &ExecutionPayloadHeader {
        &self.state.latest_execution_payload_header
    }

    pub fn set_latest_execution_payload_header(&mut self, header: ExecutionPayloadHeader) {
        self.state.latest_execution_payload_header = header;
    }

    pub fn next_withdrawal_index(&self) -> u64 {
        self.state.next_withdrawal_index
    }

    pub fn set_next_withdrawal_index(&mut self, index: u64) {
        self.state.next_withdrawal_index = index;
    }

    pub fn next_withdrawal_validator_index(&self) -> u64 {
        self.state.next_withdrawal_validator_index
    }

    pub fn set_next_withdrawal_validator_index(&mut self, index: u64) {
        self.state.next_withdrawal_validator_index = index;
    }

    pub fn pending_partial_withdrawals(&self) -> &[PendingPartialWithdrawal] {
        &self.state.pending_partial_withdrawals
    }

    pub fn set_pending_partial_withdrawals(
        &mut self,
        withdrawals: Vec<PendingPartialWithdrawal>,
    ) -> Result<(), StateTransitionError> {
        self.state.pending_partial_withdrawals = VariableList::new(withdrawals)
            .map_err(|err| anyhow!("too many pending partial withdrawals: {err:?}"))?;
        Ok(())
    }

    pub fn get_pending_balance_to_withdraw(&self, index: u64) -> u64 {
        self.state.get_pending_balance_to_withdraw(index)
    }

    pub fn earliest_exit_epoch(&self) -> u64 {
        self.state.earliest_exit_epoch
    }

    pub fn set_earliest_exit_epoch(&mut self, epoch: u64) {
        self.state.earliest_exit_epoch = epoch;
    }

    pub fn exit_balance_to_consume(&self) -> u64 {
        self.state.exit_balance_to_consume
    }

    pub fn set_exit_balance_to_consume(&mut self, balance: u64) {
        self.state.exit_balance_to_consume = balance;
    }

    pub fn block_root_at_index(&self, index: u64) -> Result<B256, StateTransitionError> {
        self.state
            .block_roots
            .get(index as usize)
            .copied()
            .ok_or_else(|| out_of_range("block root", index))
    }

    pub fn update_block_root_at_index(
        &mut self,
        index: u64,
        root: B256,
    ) -> Result<(), StateTransitionError> {
        let slot = self
            .state
            .block_roots
            .get_mut(index as usize)
            .ok_or_else(|| out_of_range("block root", index))?;
        *slot = root;
        Ok(())
    }

    pub fn state_root_at_index(&self, index: u64) -> Result<B256, StateTransitionError> {
        self.state
            .state_roots
            .get(index as usize)
            .copied()
            .ok_or_else(|| out_of_range("state root", index))
    }

    pub fn update_state_root_at_index(
        &mut self,
        index: u64,
        root: B256,
    ) -> Result<(), StateTransitionError> {
        let slot = self
            .state
            .state_roots
            .get_mut(index as usize)
            .ok_or_else(|| out_of_range("state root", index))?;
        *slot = root;
        Ok(())
    }

    pub fn randao_mix_at_index(&self, index: u64) -> Result<B256, StateTransitionError> {
        self.state
            .randao_mixes
            .get(index as usize)
            .copied()
            .ok_or_else(|| out_of_range("randao mix", index))
    }

    pub fn update_randao_mix_at_index(
        &mut self,
        index: u64,
        mix: B256,
    ) -> Result<(), StateTransitionError> {
        let slot = self
            .state
            .randao_mixes
            .get_mut(index as usize)
            .ok_or_else(|| out_of_range("randao mix", index))?;
        *slot = mix;
        Ok(())
    }

    pub fn update_slashing_at_index(
        &mut self,
        index: u64,
        amount: u64,
    ) -> Result<(), StateTransitionError> {
        let slot = self
            .state
            .slashings
            .get_mut(index as usize)
            .ok_or_else(|| out_of_range("slashing", index))?;
        let previous = std::mem::replace(slot, amount);
        self.state.total_slashing = self
            .state
            .total_slashing
            .checked_sub(previous)
            .and_then(|total| total.checked_add(amount))
            .ok_or_else(|| anyhow!("total slashing is out of sync"))?;
        Ok(())
    }

    pub fn validators(&self) -> &[Validator] {
        &self.state.validators
    }

    pub fn total_validators(&self) -> u64 {
        self.state.validators.len() as u64
    }

    pub fn validator_by_index(&self, index: u64) -> Result<&Validator, StateTransitionError> {
        self.state
            .validators
            .get(index as usize)
            .ok_or_else(|| out_of_range("validator", index))
    }

    /// The validator proposing a block. An index the registry does not hold is a fault of the
    /// block, not of the node.
    pub fn proposer_by_index(&self, index: u64) -> Result<&Validator, StateTransitionError> {
        self.state.validators.get(index as usize).ok_or(
            StateTransitionError::ProposerIndexOutOfRange {
                index,
                total: self.total_validators(),
            },
        )
    }

    /// Overwrite the validator at ``index``. The pubkey of a registered validator never changes.
    pub fn update_validator_at_index(
        &mut self,
        index: u64,
        validator: Validator,
    ) -> Result<(), StateTransitionError> {
        let slot = self
            .state
            .validators
            .get_mut(index as usize)
            .ok_or_else(|| out_of_range("validator", index))?;
        if slot.pubkey != validator.pubkey {
            return Err(anyhow!("validator {index} pubkey cannot change").into());
        }
        *slot = validator;
        Ok(())
    }

    pub fn validator_index_by_pubkey(&self, pubkey: &PubKey) -> Option<u64> {
        self.pubkey_index.get(pubkey).copied()
    }

    pub fn balances(&self) -> &[u64] {
        &self.state.balances
    }

    pub fn balance(&self, index: u64) -> Result<u64, StateTransitionError> {
        self.state
            .balances
            .get(index as usize)
            .copied()
            .ok_or_else(|| out_of_range("balance", index))
    }

    pub fn set_balance(&mut self, index: u64, balance: u64) -> Result<(), StateTransitionError> {
        let slot = self
            .state
            .balances
            .get_mut(index as usize)
            .ok_or_else(|| out_of_range("balance", index))?;
        *slot = balance;
        Ok(())
    }

    pub fn increase_balance(&mut self, index: u64, delta: u64) -> Result<(), StateTransitionError> {
        Ok(self.state.increase_balance(index, delta)?)
    }

    pub fn decrease_balance(&mut self, index: u64, delta: u64) -> Result<(), StateTransitionError> {
        Ok(self.state.decrease_balance(index, delta)?)
    }

    /// Append a new validator and its balance, returning its index.
    pub fn add_validator(
        &mut self,
        validator: Validator,
        balance: u64,
    ) -> Result<u64, StateTransitionError> {
        if self.pubkey_index.contains_key(&validator.pubkey) {
            return Err(anyhow!("validator {:?} already registered", validator.pubkey).into());
        }
        let pubkey = validator.pubkey.clone();
        let index = self.state.add_validator(validator, balance)?;
        self.pubkey_index.insert(pubkey, index);
        Ok(index)
    }
}
