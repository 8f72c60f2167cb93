use std::sync::{Arc, atomic::AtomicBool};

use alloy_primitives::Bytes;
use sha2::{Digest, Sha256};
use stf_bls::PubKey;
use stf_chain_spec::ChainSpec;
use stf_consensus::{beacon_block::BeaconBlock, validator_update::ValidatorUpdate};
use stf_execution_engine::engine_trait::ExecutionApi;
use stf_metrics::{
    STATE_TRANSITION_TIME, VALIDATOR_UPDATES, inc_int_counter_vec, start_timer_vec, stop_timer,
};
use stf_storage::deposit_store::DepositStore;
use tracing::debug;

use crate::{context::TransitionContext, error::StateTransitionError, state_db::StateDB};

/// Maps a validator key to the address the consensus engine knows the validator by.
pub type ProposerAddressFn = Arc<dyn Fn(&PubKey) -> anyhow::Result<Bytes> + Send + Sync>;

/// CometBFT addresses are the first 20 bytes of the SHA-256 digest of the public key.
pub fn cometbft_address(pubkey: &PubKey) -> anyhow::Result<Bytes> {
    let digest = Sha256::digest(pubkey.to_bytes());
    Ok(Bytes::copy_from_slice(&digest[..20]))
}

/// Beacon chain state transition function.
pub struct StateProcessor {
    pub(crate) chain_spec: Arc<ChainSpec>,
    pub(crate) execution_engine: Arc<dyn ExecutionApi>,
    pub(crate) deposit_store: Arc<dyn DepositStore>,
    pub(crate) proposer_address: ProposerAddressFn,
    pub(crate) deneb1_logged: AtomicBool,
}

impl StateProcessor {
    pub fn new(
        chain_spec: Arc<ChainSpec>,
        execution_engine: Arc<dyn ExecutionApi>,
        deposit_store: Arc<dyn DepositStore>,
    ) -> Self {
        Self {
            chain_spec,
            execution_engine,
            deposit_store,
            proposer_address: Arc::new(cometbft_address),
            deneb1_logged: AtomicBool::new(false),
        }
    }

    pub fn with_proposer_address_fn(mut self, proposer_address: ProposerAddressFn) -> Self {
        self.proposer_address = proposer_address;
        self
    }

    pub fn chain_spec(&self) -> &ChainSpec {
        &self.chain_spec
    }

    /// Advance ``state`` to ``block.slot`` and apply ``block``.
    ///
    /// The work happens on a copy of ``state`` that replaces the caller's state only when every
    /// step succeeded. Returns the validator set changes for the consensus engine.
    pub async fn transition(
        &self,
        ctx: &TransitionContext,
        state: &mut StateDB,
        block: &BeaconBlock,
    ) -> Result<Vec<ValidatorUpdate>, StateTransitionError> {
        let timer = start_timer_vec(&STATE_TRANSITION_TIME, &["transition"]);

        let mut st = state.clone();
        let validator_updates = self.process_slots(&mut st, block.slot)?;

        let timestamp = block.body.execution_payload.timestamp;
        self.process_fork(&mut st, timestamp, true)?;
        self.apply_corrections(&mut st, timestamp)?;

        self.process_block(ctx, &mut st, block).await?;

        *state = st;
        stop_timer(timer);

        let removals = validator_updates
            .iter()
            .filter(|update| update.is_removal())
            .count() as u64;
        inc_int_counter_vec(&VALIDATOR_UPDATES, removals, &["removal"]);
        inc_int_counter_vec(
            &VALIDATOR_UPDATES,
            validator_updates.len() as u64 - removals,
            &["update"],
        );
        debug!(
            slot = block.slot,
            block_root = %block.block_root(),
            validator_updates = validator_updates.len(),
            "Processed state transition"
        );

        Ok(validator_updates)
    }

    /// Apply ``block`` to a state already advanced to its slot.
    pub async fn process_block(
        &self,
        ctx: &TransitionContext,
        st: &mut StateDB,
        block: &BeaconBlock,
    ) -> Result<(), StateTransitionError> {
        self.process_block_header(ctx, st, block)?;
        self.process_execution_payload(ctx, st, block).await?;
        self.process_withdrawals(st, &block.body.execution_payload)?;
        self.process_randao_reveal(ctx, st, block)?;
        self.process_operations(st, &block.body)?;

        if !ctx.verify_result {
            return Ok(());
        }

        let state_root = st.hash_tree_root();
        if block.state_root != state_root {
            return Err(StateTransitionError::StateRootMismatch {
                expected: state_root,
                actual: block.state_root,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cometbft_address_is_truncated_digest() {
        let pubkey = PubKey::default();
        let address = cometbft_address(&pubkey).unwrap();
        assert_eq!(address.len(), 20);
        assert_eq!(&address[..], &Sha256::digest([0u8; 48])[..20]);
    }
}
