use stf_consensus::{beacon_block::BeaconBlock, execution_payload_header::ExecutionPayloadHeader};
use stf_execution_engine::new_payload_request::NewPayloadRequest;
use stf_metrics::{
    PAYLOAD_GAS_USED, PAYLOAD_TIMESTAMP_SKEW, observe_histogram_vec, set_int_gauge_vec,
};
use tracing::debug;

use crate::{
    context::TransitionContext, error::StateTransitionError, processor::StateProcessor,
    state_db::StateDB,
};

impl StateProcessor {
    /// Validate the block's execution payload and cache its header in the state.
    ///
    /// Payload validation, which includes the round trip to the execution client, runs
    /// concurrently with the header derivation.
    pub async fn process_execution_payload(
        &self,
        ctx: &TransitionContext,
        st: &mut StateDB,
        block: &BeaconBlock,
    ) -> Result<(), StateTransitionError> {
        let payload = &block.body.execution_payload;

        let (_, header) = tokio::try_join!(
            async {
                if ctx.verify_payload {
                    self.validate_execution_payload(ctx, st, block).await
                } else {
                    Ok(())
                }
            },
            async {
                Ok::<ExecutionPayloadHeader, StateTransitionError>(
                    payload.to_execution_payload_header(),
                )
            },
        )?;

        if ctx.meter_gas {
            observe_histogram_vec(&PAYLOAD_GAS_USED, payload.gas_used as f64, &[]);
            set_int_gauge_vec(
                &PAYLOAD_TIMESTAMP_SKEW,
                ctx.consensus_time as i64 - payload.timestamp as i64,
                &[],
            );
        }

        debug!(
            block_number = payload.block_number,
            block_hash = %payload.block_hash,
            "Processed execution payload"
        );
        st.set_latest_execution_payload_header(header);
        Ok(())
    }

    async fn validate_execution_payload(
        &self,
        ctx: &TransitionContext,
        st: &StateDB,
        block: &BeaconBlock,
    ) -> Result<(), StateTransitionError> {
        self.validate_stateless_payload(block)?;
        self.validate_stateful_payload(ctx, st, block)?;

        self.execution_engine
            .notify_new_payload(NewPayloadRequest::from_block(block), ctx.optimistic_engine)
            .await?;
        Ok(())
    }

    fn validate_stateless_payload(&self, block: &BeaconBlock) -> Result<(), StateTransitionError> {
        let payload = &block.body.execution_payload;

        let max_withdrawals = self.chain_spec.max_withdrawals_per_payload;
        if payload.withdrawals.len() as u64 > max_withdrawals {
            return Err(StateTransitionError::ExceedMaximumWithdrawals {
                max: max_withdrawals,
                actual: payload.withdrawals.len() as u64,
            });
        }

        let max_blobs = self.chain_spec.max_blobs_per_block;
        let blobs = block.body.blob_kzg_commitments.len() as u64;
        if blobs > max_blobs {
            return Err(StateTransitionError::ExceedsBlockBlobLimit {
                max: max_blobs,
                actual: blobs,
            });
        }

        Ok(())
    }

    fn validate_stateful_payload(
        &self,
        ctx: &TransitionContext,
        st: &StateDB,
        block: &BeaconBlock,
    ) -> Result<(), StateTransitionError> {
        let payload = &block.body.execution_payload;

        // Verify consistency of the parent hash with respect to the previous execution payload
        // header
        let parent_hash = st.latest_execution_payload_header().block_hash;
        if payload.parent_hash != parent_hash {
            return Err(StateTransitionError::ParentPayloadHashMismatch {
                expected: parent_hash,
                actual: payload.parent_hash,
            });
        }

        // Verify timestamp
        if payload.timestamp > ctx.next_payload_timestamp {
            return Err(StateTransitionError::TooFarInTheFuture {
                bound: ctx.next_payload_timestamp,
                actual: payload.timestamp,
            });
        }

        // Verify prev_randao
        let epoch = self.get_current_epoch(st);
        let randao_mix =
            st.randao_mix_at_index(epoch % self.chain_spec.epochs_per_historical_vector)?;
        if payload.prev_randao != randao_mix {
            return Err(StateTransitionError::RandaoMixMismatch {
                expected: randao_mix,
                actual: payload.prev_randao,
            });
        }

        Ok(())
    }
}
