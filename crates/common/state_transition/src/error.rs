use alloy_primitives::{B256, Bytes, aliases::B32};
use stf_execution_engine::errors::EngineError;
use stf_storage::errors::StoreError;
use thiserror::Error;

/// How the consensus integration should treat a failed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The block is invalid and must be rejected.
    Validation,
    /// A local fault unrelated to the block.
    Internal,
    /// The execution client could not judge the payload. The block may be retried.
    EngineUnavailable,
}

#[derive(Debug, Error)]
pub enum StateTransitionError {
    #[error("Block slot mismatch: expected {expected}, got {actual}")]
    SlotMismatch { expected: u64, actual: u64 },

    #[error("Block slot too low: expected > {latest}, got {actual}")]
    BlockSlotTooLow { latest: u64, actual: u64 },

    #[error("Proposer mismatch: state key {expected}, consensus key {actual}")]
    ProposerMismatch { expected: Bytes, actual: Bytes },

    #[error("Parent root mismatch: expected {expected}, got {actual}")]
    ParentRootMismatch { expected: B256, actual: B256 },

    #[error("Proposer index {index} out of range, state has {total} validators")]
    ProposerIndexOutOfRange { index: u64, total: u64 },

    #[error("Block proposer {0} is slashed")]
    SlashedProposer(u64),

    #[error("State root mismatch: expected {expected}, got {actual}")]
    StateRootMismatch { expected: B256, actual: B256 },

    #[error("Payload timestamp too far in the future: bound {bound}, got {actual}")]
    TooFarInTheFuture { bound: u64, actual: u64 },

    #[error("Payload carries {actual} withdrawals, maximum is {max}")]
    ExceedMaximumWithdrawals { max: u64, actual: u64 },

    #[error("Block carries {actual} blob commitments, maximum is {max}")]
    ExceedsBlockBlobLimit { max: u64, actual: u64 },

    #[error("Payload parent hash mismatch: expected {expected}, got {actual}")]
    ParentPayloadHashMismatch { expected: B256, actual: B256 },

    #[error("Payload prev_randao mismatch: expected {expected}, got {actual}")]
    RandaoMixMismatch { expected: B256, actual: B256 },

    #[error("Invalid RANDAO reveal for proposer {0}")]
    InvalidRandaoReveal(u64),

    #[error("Withdrawals count mismatch: expected {expected}, got {actual}")]
    NumWithdrawalsMismatch { expected: usize, actual: usize },

    #[error("Payload carries no withdrawals")]
    ZeroWithdrawals,

    #[error("First withdrawal is not the EVM inflation withdrawal")]
    FirstWithdrawalNotEvmInflation,

    #[error("Withdrawal {position} does not match the expected withdrawal")]
    WithdrawalMismatch { position: usize },

    #[error("Block carries {actual} deposits, maximum is {max}")]
    ExceedsBlockDepositLimit { max: u64, actual: u64 },

    #[error("Deposit store holds {local} deposits up to this block, block implies {expected}")]
    DepositsLengthMismatch { expected: u64, local: u64 },

    #[error("Deposit index out of order: expected {expected}, got {actual}")]
    DepositIndexOutOfOrder { expected: u64, actual: u64 },

    #[error("Deposit {0} does not match the local deposit store")]
    DepositMismatch(u64),

    #[error("Deposit root mismatch: local {local}, block {block}")]
    DepositRootMismatch { local: B256, block: B256 },

    #[error("Genesis requires at least one deposit")]
    NoGenesisDeposits,

    #[error("Genesis carries {actual} deposits, validator set cap is {cap}")]
    GenesisDepositsExceedCap { cap: u64, actual: u64 },

    #[error("Genesis deposit index out of order: expected {expected}, got {actual}")]
    GenesisDepositIndexOutOfOrder { expected: u64, actual: u64 },

    #[error("Cannot downgrade state from {current} to {target}")]
    ForkDowngrade { current: B32, target: B32 },

    #[error("Execution requests are not allowed before Electra, state fork is {0}")]
    ExecutionRequestsBeforeElectra(B32),

    #[error("Cannot process slots backwards: state at {current}, target {target}")]
    TargetSlotInPast { current: u64, target: u64 },

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl StateTransitionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StateTransitionError::Engine(err) if err.is_invalid_payload() => ErrorKind::Validation,
            StateTransitionError::Engine(_) => ErrorKind::EngineUnavailable,
            StateTransitionError::Store(_) | StateTransitionError::Internal(_) => {
                ErrorKind::Internal
            }
            _ => ErrorKind::Validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::anyhow;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::structural(StateTransitionError::ZeroWithdrawals, ErrorKind::Validation)]
    #[case::unknown_proposer(
        StateTransitionError::ProposerIndexOutOfRange { index: 9, total: 2 },
        ErrorKind::Validation
    )]
    #[case::invalid_payload(
        EngineError::InvalidPayload("bad".into()).into(),
        ErrorKind::Validation
    )]
    #[case::invalid_block_hash(
        EngineError::InvalidBlockHash("bad".into()).into(),
        ErrorKind::Validation
    )]
    #[case::syncing(EngineError::Syncing.into(), ErrorKind::EngineUnavailable)]
    #[case::timeout(
        EngineError::Timeout(Duration::from_secs(1)).into(),
        ErrorKind::EngineUnavailable
    )]
    #[case::store(StoreError::FieldNotInitialized.into(), ErrorKind::Internal)]
    #[case::internal(anyhow!("boom").into(), ErrorKind::Internal)]
    fn test_error_kind(#[case] err: StateTransitionError, #[case] expected: ErrorKind) {
        assert_eq!(err.kind(), expected);
    }
}
