use std::sync::{Arc, LazyLock};

use alloy_primitives::{address, fixed_bytes};
use stf_consensus::constants::{DENEB_FORK_VERSION, DENEB1_FORK_VERSION, ELECTRA_FORK_VERSION};

use crate::spec::{ChainSpec, Network};

pub const MAINNET_ETH1_CHAIN_ID: u64 = 80094;
pub const BEPOLIA_ETH1_CHAIN_ID: u64 = 80069;
pub const DEVNET_ETH1_CHAIN_ID: u64 = 80087;

pub static MAINNET: LazyLock<Arc<ChainSpec>> = LazyLock::new(|| {
    ChainSpec {
        network: Network::Mainnet,
        deposit_eth1_chain_id: MAINNET_ETH1_CHAIN_ID,
        genesis_time: 1737381600,
        seconds_per_slot: 2,
        slots_per_epoch: 192,
        min_epochs_for_blobs_sidecars_request: 4096,
        min_validator_withdrawability_delay: 256,
        genesis_fork_version: DENEB_FORK_VERSION,
        deneb1_fork_version: DENEB1_FORK_VERSION,
        electra_fork_version: ELECTRA_FORK_VERSION,
        deneb1_fork_time: 1738415507,
        electra_fork_time: 1749056400,
        max_effective_balance: 10_000_000_000_000_000,
        ejection_balance: 240_000_000_000_000,
        effective_balance_increment: 10_000_000_000_000,
        hysteresis_quotient: 4,
        hysteresis_downward_multiplier: 1,
        hysteresis_upward_multiplier: 5,
        slots_per_historical_root: 8,
        epochs_per_historical_vector: 8,
        epochs_per_slashings_vector: 8,
        max_deposits_per_block: 16,
        max_withdrawals_per_payload: 16,
        max_validators_per_withdrawals_sweep: 31,
        max_pending_partials_per_withdrawals_sweep: 8,
        pending_partial_withdrawals_limit: 64,
        max_blobs_per_block: 6,
        validator_set_cap: 69,
        evm_inflation_address: address!("0x289274787bAF083C15A45a174b7a8e44F0720660"),
        evm_inflation_per_block: 5_750_000_000,
        min_per_epoch_churn_limit_electra: 10_000_000_000_000_000,
        max_per_epoch_activation_exit_churn_limit: 20_000_000_000_000_000,
        churn_limit_quotient: 65536,
        domain_type_proposer: fixed_bytes!("0x00000000"),
        domain_type_randao: fixed_bytes!("0x02000000"),
        domain_type_deposit: fixed_bytes!("0x03000000"),
        invoke_inert_epoch_hooks: false,
        corrections: vec![],
    }
    .into()
});

pub static BEPOLIA: LazyLock<Arc<ChainSpec>> = LazyLock::new(|| {
    ChainSpec {
        network: Network::Bepolia,
        deposit_eth1_chain_id: BEPOLIA_ETH1_CHAIN_ID,
        genesis_time: 1739976735,
        deneb1_fork_time: 1740090694,
        electra_fork_time: 1746633600,
        evm_inflation_per_block: 10_000_000_000,
        ..(**MAINNET).clone()
    }
    .into()
});

pub static DEVNET: LazyLock<Arc<ChainSpec>> = LazyLock::new(|| {
    ChainSpec {
        network: Network::Devnet,
        deposit_eth1_chain_id: DEVNET_ETH1_CHAIN_ID,
        genesis_time: 0,
        slots_per_epoch: 32,
        deneb1_fork_time: 0,
        electra_fork_time: 0,
        validator_set_cap: 256,
        evm_inflation_address: address!("0x6942069420694206942069420694206942069420"),
        evm_inflation_per_block: 10_000_000_000,
        ..(**MAINNET).clone()
    }
    .into()
});
