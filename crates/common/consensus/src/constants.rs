use alloy_primitives::{B256, aliases::B32, fixed_bytes};

pub const COMPOUNDING_WITHDRAWAL_PREFIX: &[u8] = &[0x02];
pub const ETH1_ADDRESS_WITHDRAWAL_PREFIX: &[u8] = &[0x01];
pub const FAR_FUTURE_EPOCH: u64 = u64::MAX;
pub const FULL_EXIT_REQUEST_AMOUNT: u64 = 0;
pub const GENESIS_EPOCH: u64 = 0;
pub const GENESIS_SLOT: u64 = 0;
pub const VERSIONED_HASH_VERSION_KZG: u8 = 0x01;
pub const ZERO_ROOT: B256 = B256::ZERO;

/// The first withdrawal of every payload mints the EVM inflation; it never belongs to a
/// validator and never advances the withdrawal index.
pub const EVM_INFLATION_WITHDRAWAL_INDEX: u64 = 0;
pub const EVM_INFLATION_WITHDRAWAL_VALIDATOR_INDEX: u64 = 0;

pub const DENEB_FORK_VERSION: B32 = fixed_bytes!("0x04000000");
pub const DENEB1_FORK_VERSION: B32 = fixed_bytes!("0x04010000");
pub const ELECTRA_FORK_VERSION: B32 = fixed_bytes!("0x05000000");

pub const DEPOSIT_REQUEST_TYPE: u8 = 0x00;
pub const WITHDRAWAL_REQUEST_TYPE: u8 = 0x01;
pub const CONSOLIDATION_REQUEST_TYPE: u8 = 0x02;
