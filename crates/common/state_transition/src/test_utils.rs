use std::sync::Arc;

use alloy_primitives::B256;
use stf_bls::PubKey;
use stf_chain_spec::{ChainSpec, networks::DEVNET};
use stf_consensus::{
    constants::{ETH1_ADDRESS_WITHDRAWAL_PREFIX, FAR_FUTURE_EPOCH},
    validator::Validator,
};
use stf_execution_engine::mock_engine::MockExecutionEngine;
use stf_storage::deposit_store::InMemoryDepositStore;

use crate::{processor::StateProcessor, state_db::StateDB};

pub fn pubkey(byte: u8) -> PubKey {
    let mut pubkey = PubKey::default();
    pubkey.inner[0] = byte;
    pubkey
}

pub fn eth1_credentials(byte: u8) -> B256 {
    let mut credentials = B256::ZERO;
    credentials[0] = ETH1_ADDRESS_WITHDRAWAL_PREFIX[0];
    credentials[12..].copy_from_slice(&[byte; 20]);
    credentials
}

/// A validator active since genesis.
pub fn validator(byte: u8, effective_balance: u64) -> Validator {
    Validator {
        pubkey: pubkey(byte),
        withdrawal_credentials: eth1_credentials(byte),
        effective_balance,
        slashed: false,
        activation_eligibility_epoch: 0,
        activation_epoch: 0,
        exit_epoch: FAR_FUTURE_EPOCH,
        withdrawable_epoch: FAR_FUTURE_EPOCH,
    }
}

/// A state whose registry holds one active validator per entry of ``balances``, with pubkeys
/// starting at byte 1 and effective balances equal to their balances.
pub fn state_with_validators(balances: &[u64]) -> StateDB {
    let mut st = StateDB::default();
    for (i, balance) in balances.iter().enumerate() {
        st.add_validator(validator(i as u8 + 1, *balance), *balance)
            .expect("fresh pubkey");
    }
    st
}

pub fn processor_with(chain_spec: ChainSpec) -> StateProcessor {
    processor_with_engine(chain_spec, Arc::new(MockExecutionEngine::new()))
}

pub fn processor_with_engine(
    chain_spec: ChainSpec,
    execution_engine: Arc<MockExecutionEngine>,
) -> StateProcessor {
    StateProcessor::new(
        Arc::new(chain_spec),
        execution_engine,
        Arc::new(InMemoryDepositStore::new()),
    )
}

pub fn processor_with_deposits(
    chain_spec: ChainSpec,
    deposit_store: Arc<InMemoryDepositStore>,
) -> StateProcessor {
    StateProcessor::new(
        Arc::new(chain_spec),
        Arc::new(MockExecutionEngine::new()),
        deposit_store,
    )
}

pub fn test_processor() -> StateProcessor {
    processor_with((**DEVNET).clone())
}
