use alloy_primitives::B256;
use stf_consensus::validator_update::ValidatorUpdate;
use stf_metrics::{STATE_TRANSITION_TIME, start_timer_vec, stop_timer};
use tree_hash::TreeHash;

use crate::{error::StateTransitionError, processor::StateProcessor, state_db::StateDB};

impl StateProcessor {
    /// Advance ``st`` to ``slot``, running epoch processing on every epoch boundary crossed.
    ///
    /// The returned updates are the concatenation of each boundary's diff in order. A later entry
    /// for the same pubkey supersedes an earlier one.
    pub fn process_slots(
        &self,
        st: &mut StateDB,
        slot: u64,
    ) -> Result<Vec<ValidatorUpdate>, StateTransitionError> {
        if slot < st.slot() {
            return Err(StateTransitionError::TargetSlotInPast {
                current: st.slot(),
                target: slot,
            });
        }

        let timer = start_timer_vec(&STATE_TRANSITION_TIME, &["process_slots"]);
        let mut validator_updates = vec![];
        while st.slot() < slot {
            self.process_slot(st)?;

            // Process epoch on the start slot of the next epoch
            if (st.slot() + 1) % self.chain_spec.slots_per_epoch == 0 {
                validator_updates.extend(self.process_epoch(st)?);
            }

            st.set_slot(st.slot() + 1);
        }
        stop_timer(timer);

        Ok(validator_updates)
    }

    fn process_slot(&self, st: &mut StateDB) -> Result<(), StateTransitionError> {
        let index = st.slot() % self.chain_spec.slots_per_historical_root;

        // Cache state root
        let previous_state_root = st.hash_tree_root();
        st.update_state_root_at_index(index, previous_state_root)?;

        // Cache latest block header state root
        let mut latest_block_header = st.latest_block_header().clone();
        if latest_block_header.state_root == B256::ZERO {
            latest_block_header.state_root = previous_state_root;
            st.set_latest_block_header(latest_block_header.clone());
        }

        // Cache block root
        st.update_block_root_at_index(index, latest_block_header.tree_hash_root())
    }
}

#[cfg(test)]
mod tests {
    use stf_chain_spec::{ChainSpec, networks::DEVNET};
    use stf_consensus::constants::FAR_FUTURE_EPOCH;

    use super::*;
    use crate::test_utils::{processor_with, pubkey, state_with_validators, test_processor};

    const INCREMENT: u64 = 10_000_000_000_000;

    #[test]
    fn test_processing_current_slot_is_a_no_op() {
        let processor = test_processor();
        let mut st = state_with_validators(&[400 * INCREMENT]);
        st.set_slot(5);
        let root = st.hash_tree_root();

        assert!(processor.process_slots(&mut st, 5).unwrap().is_empty());
        assert_eq!(st.hash_tree_root(), root);
        assert!(matches!(
            processor.process_slots(&mut st, 4),
            Err(StateTransitionError::TargetSlotInPast { current: 5, target: 4 })
        ));
    }

    #[test]
    fn test_slot_caches_roots() {
        let processor = test_processor();
        let mut st = state_with_validators(&[400 * INCREMENT]);
        let pre_state_root = st.hash_tree_root();

        processor.process_slots(&mut st, 1).unwrap();

        assert_eq!(st.slot(), 1);
        assert_eq!(st.state_root_at_index(0).unwrap(), pre_state_root);
        assert_eq!(st.latest_block_header().state_root, pre_state_root);
        assert_eq!(
            st.block_root_at_index(0).unwrap(),
            st.latest_block_header().tree_hash_root()
        );
    }

    #[test]
    fn test_epoch_diffs_are_concatenated() {
        let processor = processor_with(ChainSpec {
            slots_per_epoch: 4,
            ..(**DEVNET).clone()
        });
        let mut st = state_with_validators(&[400 * INCREMENT, 400 * INCREMENT, 30 * INCREMENT]);
        st.set_balance(1, 403 * INCREMENT).unwrap();
        let mut pending = st.validator_by_index(2).unwrap().clone();
        pending.activation_eligibility_epoch = FAR_FUTURE_EPOCH;
        pending.activation_epoch = FAR_FUTURE_EPOCH;
        st.update_validator_at_index(2, pending).unwrap();

        // The top-up lands at the first boundary, the activation at the second
        let updates = processor.process_slots(&mut st, 8).unwrap();
        assert_eq!(
            updates,
            vec![
                ValidatorUpdate {
                    pubkey: pubkey(2),
                    effective_balance: 403 * INCREMENT,
                },
                ValidatorUpdate {
                    pubkey: pubkey(3),
                    effective_balance: 30 * INCREMENT,
                },
            ]
        );
        assert_eq!(st.slot(), 8);
        assert_eq!(st.validator_by_index(2).unwrap().activation_epoch, 2);
    }
}
