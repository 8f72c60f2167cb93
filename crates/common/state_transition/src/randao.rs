use alloy_primitives::B256;
use ethereum_hashing::hash;
use stf_bls::traits::Verifiable;
use stf_consensus::{
    beacon_block::BeaconBlock,
    misc::{compute_domain, compute_signing_root, xor},
};

use crate::{
    context::TransitionContext, error::StateTransitionError, processor::StateProcessor,
    state_db::StateDB,
};

impl StateProcessor {
    /// Signing root of the RANDAO reveal expected for ``epoch``.
    pub fn randao_signing_root(&self, st: &StateDB, epoch: u64) -> B256 {
        let domain = compute_domain(
            self.chain_spec.domain_type_randao,
            self.chain_spec.active_fork_version_for_epoch(epoch),
            st.genesis_validators_root(),
        );
        compute_signing_root(epoch, domain)
    }

    pub fn process_randao_reveal(
        &self,
        ctx: &TransitionContext,
        st: &mut StateDB,
        block: &BeaconBlock,
    ) -> Result<(), StateTransitionError> {
        let epoch = self.get_current_epoch(st);
        let reveal = &block.body.randao_reveal;

        // Verify RANDAO reveal
        if ctx.verify_randao {
            let proposer = st.proposer_by_index(block.proposer_index)?;
            let signing_root = self.randao_signing_root(st, epoch);
            if !matches!(reveal.verify(&proposer.pubkey, signing_root.as_slice()), Ok(true)) {
                return Err(StateTransitionError::InvalidRandaoReveal(block.proposer_index));
            }
        }

        // Mix in RANDAO reveal
        let index = epoch % self.chain_spec.epochs_per_historical_vector;
        let mix = xor(
            st.randao_mix_at_index(index)?.as_slice(),
            hash(reveal.to_bytes()).as_slice(),
        );
        st.update_randao_mix_at_index(index, mix)
    }
}
