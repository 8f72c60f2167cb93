use alloy_primitives::B256;
use stf_consensus::{beacon_block::BeaconBlock, beacon_block_header::BeaconBlockHeader};
use tree_hash::TreeHash;

use crate::{
    context::TransitionContext, error::StateTransitionError, processor::StateProcessor,
    state_db::StateDB,
};

impl StateProcessor {
    pub fn process_block_header(
        &self,
        ctx: &TransitionContext,
        st: &mut StateDB,
        block: &BeaconBlock,
    ) -> Result<(), StateTransitionError> {
        // Verify that the slots match
        if block.slot != st.slot() {
            return Err(StateTransitionError::SlotMismatch {
                expected: st.slot(),
                actual: block.slot,
            });
        }

        // Verify that the block is newer than latest block header
        let latest_block_header = st.latest_block_header();
        if block.slot <= latest_block_header.slot {
            return Err(StateTransitionError::BlockSlotTooLow {
                latest: latest_block_header.slot,
                actual: block.slot,
            });
        }

        // Verify that proposer index is the correct index
        let proposer = st.proposer_by_index(block.proposer_index)?;
        let proposer_address = (self.proposer_address)(&proposer.pubkey)?;
        if proposer_address != ctx.proposer_address {
            return Err(StateTransitionError::ProposerMismatch {
                expected: proposer_address,
                actual: ctx.proposer_address.clone(),
            });
        }

        // Verify that the parent matches
        let parent_root = st.latest_block_header().tree_hash_root();
        if block.parent_root != parent_root {
            return Err(StateTransitionError::ParentRootMismatch {
                expected: parent_root,
                actual: block.parent_root,
            });
        }

        // Verify proposer is not slashed
        if proposer.slashed {
            return Err(StateTransitionError::SlashedProposer(block.proposer_index));
        }

        // Cache current block as the new latest block
        st.set_latest_block_header(BeaconBlockHeader {
            // Overwritten in the next process_slot call
            state_root: B256::ZERO,
            ..block.header()
        });

        Ok(())
    }
}
