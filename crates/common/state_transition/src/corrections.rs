use stf_chain_spec::corrections::{CorrectionAction, StateCorrection};
use stf_consensus::{constants::GENESIS_SLOT, validator::Validator};
use tracing::info;

use crate::{error::StateTransitionError, processor::StateProcessor, state_db::StateDB};

impl StateProcessor {
    /// Apply the network's one-off state corrections that fire for the block at ``timestamp``.
    ///
    /// Runs after ``process_fork`` and before the block body, so the latest execution payload
    /// header still belongs to the parent. Fork triggers compare the fork schedule at both
    /// timestamps rather than the state's fork struct, which Deneb1 leaves untouched.
    pub fn apply_corrections(
        &self,
        st: &mut StateDB,
        timestamp: u64,
    ) -> Result<(), StateTransitionError> {
        let active_version = self.chain_spec.active_fork_version_for_timestamp(timestamp);
        let parent_version = (st.latest_block_header().slot != GENESIS_SLOT).then(|| {
            self.chain_spec
                .active_fork_version_for_timestamp(st.latest_execution_payload_header().timestamp)
        });
        for correction in &self.chain_spec.corrections {
            if correction.is_triggered(
                self.chain_spec.deposit_eth1_chain_id,
                st.slot(),
                parent_version,
                active_version,
            ) {
                self.apply_correction(st, correction)?;
            }
        }
        Ok(())
    }

    fn apply_correction(
        &self,
        st: &mut StateDB,
        correction: &StateCorrection,
    ) -> Result<(), StateTransitionError> {
        match &correction.action {
            CorrectionAction::ForceExit { pubkey } => {
                let Some(index) = st.validator_index_by_pubkey(pubkey) else {
                    return Ok(());
                };
                self.force_exit_next_epoch(st, index)?;
                info!(validator_index = index, slot = st.slot(), "Applied forced validator exit");
            }
            CorrectionAction::ForceCreate {
                pubkey,
                withdrawal_credentials,
                balance,
            } => {
                if st.validator_index_by_pubkey(pubkey).is_some() {
                    return Ok(());
                }
                let validator = Validator::from_deposit(
                    pubkey.clone(),
                    *withdrawal_credentials,
                    *balance,
                    self.chain_spec.effective_balance_increment,
                    self.chain_spec.max_effective_balance,
                );
                let index = st.add_validator(validator, *balance)?;
                info!(validator_index = index, slot = st.slot(), "Applied forced validator creation");
            }
        }
        Ok(())
    }
}
