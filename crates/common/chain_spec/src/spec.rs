use alloy_primitives::{Address, aliases::B32};
use anyhow::ensure;
use serde::Deserialize;
use ssz_types::typenum::Unsigned;
use stf_consensus::{
    beacon_state::{EpochsPerHistoricalVector, EpochsPerSlashingsVector, SlotsPerHistoricalRoot},
    constants::{DENEB_FORK_VERSION, DENEB1_FORK_VERSION, ELECTRA_FORK_VERSION},
    misc::checksummed_address,
};

use crate::corrections::StateCorrection;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Bepolia,
    Devnet,
    Custom(String),
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match String::deserialize(deserializer)?.as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "bepolia" => Ok(Network::Bepolia),
            "devnet" => Ok(Network::Devnet),
            custom => Ok(Network::Custom(custom.to_string())),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct ChainSpec {
    #[serde(rename = "CONFIG_NAME")]
    pub network: Network,
    pub deposit_eth1_chain_id: u64,

    // Time parameters
    pub genesis_time: u64,
    pub seconds_per_slot: u64,
    pub slots_per_epoch: u64,
    pub min_epochs_for_blobs_sidecars_request: u64,
    pub min_validator_withdrawability_delay: u64,

    // Forking
    #[serde(with = "crate::b32_hex")]
    pub genesis_fork_version: B32,
    #[serde(with = "crate::b32_hex")]
    pub deneb1_fork_version: B32,
    #[serde(with = "crate::b32_hex")]
    pub electra_fork_version: B32,
    pub deneb1_fork_time: u64,
    pub electra_fork_time: u64,

    // Gwei values
    pub max_effective_balance: u64,
    pub ejection_balance: u64,
    pub effective_balance_increment: u64,
    pub hysteresis_quotient: u64,
    pub hysteresis_downward_multiplier: u64,
    pub hysteresis_upward_multiplier: u64,

    // State list lengths
    pub slots_per_historical_root: u64,
    pub epochs_per_historical_vector: u64,
    pub epochs_per_slashings_vector: u64,

    // Max operations per block
    pub max_deposits_per_block: u64,
    pub max_withdrawals_per_payload: u64,
    pub max_validators_per_withdrawals_sweep: u64,
    pub max_pending_partials_per_withdrawals_sweep: u64,
    pub pending_partial_withdrawals_limit: u64,
    pub max_blobs_per_block: u64,

    // Berachain values
    pub validator_set_cap: u64,
    #[serde(with = "checksummed_address")]
    pub evm_inflation_address: Address,
    pub evm_inflation_per_block: u64,

    // Churn
    pub min_per_epoch_churn_limit_electra: u64,
    pub max_per_epoch_activation_exit_churn_limit: u64,
    pub churn_limit_quotient: u64,

    // Signature domains
    #[serde(with = "crate::b32_hex")]
    pub domain_type_proposer: B32,
    #[serde(with = "crate::b32_hex")]
    pub domain_type_randao: B32,
    #[serde(with = "crate::b32_hex")]
    pub domain_type_deposit: B32,

    /// Legacy networks hash the state as though the reward and slashing passes ran.
    pub invoke_inert_epoch_hooks: bool,
    #[serde(default)]
    pub corrections: Vec<StateCorrection>,
}

impl ChainSpec {
    /// Reject configurations the state processor cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.slots_per_epoch > 0, "SLOTS_PER_EPOCH must be non-zero");
        ensure!(self.seconds_per_slot > 0, "SECONDS_PER_SLOT must be non-zero");
        ensure!(
            self.effective_balance_increment > 0,
            "EFFECTIVE_BALANCE_INCREMENT must be non-zero"
        );
        ensure!(self.hysteresis_quotient > 0, "HYSTERESIS_QUOTIENT must be non-zero");
        ensure!(self.churn_limit_quotient > 0, "CHURN_LIMIT_QUOTIENT must be non-zero");
        ensure!(self.validator_set_cap > 0, "VALIDATOR_SET_CAP must be non-zero");
        ensure!(
            self.max_withdrawals_per_payload > 1,
            "MAX_WITHDRAWALS_PER_PAYLOAD must leave room for the inflation withdrawal"
        );
        ensure!(
            self.slots_per_historical_root == SlotsPerHistoricalRoot::to_u64(),
            "SLOTS_PER_HISTORICAL_ROOT must be {}, got {}",
            SlotsPerHistoricalRoot::to_u64(),
            self.slots_per_historical_root
        );
        ensure!(
            self.epochs_per_historical_vector == EpochsPerHistoricalVector::to_u64(),
            "EPOCHS_PER_HISTORICAL_VECTOR must be {}, got {}",
            EpochsPerHistoricalVector::to_u64(),
            self.epochs_per_historical_vector
        );
        ensure!(
            self.epochs_per_slashings_vector == EpochsPerSlashingsVector::to_u64(),
            "EPOCHS_PER_SLASHINGS_VECTOR must be {}, got {}",
            EpochsPerSlashingsVector::to_u64(),
            self.epochs_per_slashings_vector
        );
        ensure!(
            self.deneb1_fork_time <= self.electra_fork_time,
            "DENEB1_FORK_TIME must not be after ELECTRA_FORK_TIME"
        );
        Ok(())
    }

    pub fn slot_to_epoch(&self, slot: u64) -> u64 {
        slot / self.slots_per_epoch
    }

    /// The smallest effective balance that lets a validator become active.
    pub fn min_activation_balance(&self) -> u64 {
        self.ejection_balance + self.effective_balance_increment
    }

    pub fn active_fork_version_for_timestamp(&self, timestamp: u64) -> B32 {
        if timestamp >= self.electra_fork_time {
            self.electra_fork_version
        } else if timestamp >= self.deneb1_fork_time {
            self.deneb1_fork_version
        } else {
            self.genesis_fork_version
        }
    }

    pub fn active_fork_version_for_slot(&self, slot: u64) -> B32 {
        self.active_fork_version_for_timestamp(
            self.genesis_time
                .saturating_add(slot.saturating_mul(self.seconds_per_slot)),
        )
    }

    pub fn active_fork_version_for_epoch(&self, epoch: u64) -> B32 {
        self.active_fork_version_for_slot(epoch.saturating_mul(self.slots_per_epoch))
    }

    /// Whether blobs for ``block_slot`` must still be served as of ``current_slot``.
    pub fn within_da_period(&self, block_slot: u64, current_slot: u64) -> bool {
        self.slot_to_epoch(block_slot)
            .saturating_add(self.min_epochs_for_blobs_sidecars_request)
            >= self.slot_to_epoch(current_slot)
    }

    pub fn is_post_electra(&self, version: B32) -> bool {
        fork_order(version) >= fork_order(self.electra_fork_version)
    }

    pub fn fork_name(&self, version: B32) -> &'static str {
        fork_name(version)
    }
}

pub fn fork_name(version: B32) -> &'static str {
    if version == DENEB_FORK_VERSION {
        "deneb"
    } else if version == DENEB1_FORK_VERSION {
        "deneb1"
    } else if version == ELECTRA_FORK_VERSION {
        "electra"
    } else {
        "unknown"
    }
}

/// Position of ``version`` in the fork sequence. Fork versions compare by their big-endian
/// value, so a later fork always has a larger version.
pub fn fork_order(version: B32) -> u32 {
    u32::from_be_bytes(version.0)
}
