use alloy_primitives::Bytes;

/// Per-block inputs supplied by the consensus engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionContext {
    /// Consensus timestamp of the block being processed, in seconds.
    pub consensus_time: u64,
    /// Latest timestamp an execution payload may carry at this height.
    pub next_payload_timestamp: u64,
    /// Address the consensus engine attributes the block to.
    pub proposer_address: Bytes,
    pub verify_payload: bool,
    pub verify_randao: bool,
    pub verify_result: bool,
    pub meter_gas: bool,
    /// Treat ``SYNCING``/``ACCEPTED`` engine answers as success.
    pub optimistic_engine: bool,
}

impl TransitionContext {
    /// Full verification, used when voting on a proposal.
    pub fn validator(
        consensus_time: u64,
        next_payload_timestamp: u64,
        proposer_address: Bytes,
    ) -> Self {
        Self {
            consensus_time,
            next_payload_timestamp,
            proposer_address,
            verify_payload: true,
            verify_randao: true,
            verify_result: true,
            meter_gas: false,
            optimistic_engine: true,
        }
    }

    /// Used when finalizing a block the network already agreed on. The RANDAO reveal and state
    /// root were checked while voting, and the engine must fully validate the payload.
    pub fn follower(
        consensus_time: u64,
        next_payload_timestamp: u64,
        proposer_address: Bytes,
    ) -> Self {
        Self {
            consensus_time,
            next_payload_timestamp,
            proposer_address,
            verify_payload: true,
            verify_randao: false,
            verify_result: false,
            meter_gas: true,
            optimistic_engine: false,
        }
    }
}
