use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use stf_bls::PubKey;
use tree_hash_derive::TreeHash;

use crate::constants::{
    COMPOUNDING_WITHDRAWAL_PREFIX, ETH1_ADDRESS_WITHDRAWAL_PREFIX, FAR_FUTURE_EPOCH,
};

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct Validator {
    pub pubkey: PubKey,

    /// Commitment to pubkey for withdrawals
    pub withdrawal_credentials: B256,

    /// Balance at stake
    #[serde(with = "serde_utils::quoted_u64")]
    pub effective_balance: u64,
    pub slashed: bool,

    /// When criteria for activation were met
    #[serde(with = "serde_utils::quoted_u64")]
    pub activation_eligibility_epoch: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub activation_epoch: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub exit_epoch: u64,

    /// When validator can withdraw funds
    #[serde(with = "serde_utils::quoted_u64")]
    pub withdrawable_epoch: u64,
}

impl Validator {
    /// Build a fresh, unscheduled validator from a deposit. The effective balance is the deposit
    /// amount rounded down to ``effective_balance_increment`` and capped at
    /// ``max_effective_balance``.
    pub fn from_deposit(
        pubkey: PubKey,
        withdrawal_credentials: B256,
        amount: u64,
        effective_balance_increment: u64,
        max_effective_balance: u64,
    ) -> Self {
        Self {
            pubkey,
            withdrawal_credentials,
            effective_balance: compute_effective_balance(
                amount,
                effective_balance_increment,
                max_effective_balance,
            ),
            slashed: false,
            activation_eligibility_epoch: FAR_FUTURE_EPOCH,
            activation_epoch: FAR_FUTURE_EPOCH,
            exit_epoch: FAR_FUTURE_EPOCH,
            withdrawable_epoch: FAR_FUTURE_EPOCH,
        }
    }

    /// Check if ``validator`` has an 0x01 prefixed "eth1" withdrawal credential.
    pub fn has_eth1_withdrawal_credential(&self) -> bool {
        &self.withdrawal_credentials[..1] == ETH1_ADDRESS_WITHDRAWAL_PREFIX
    }

    /// Check if ``validator`` has an 0x02 prefixed "compounding" withdrawal credential.
    pub fn has_compounding_withdrawal_credential(&self) -> bool {
        &self.withdrawal_credentials[..1] == COMPOUNDING_WITHDRAWAL_PREFIX
    }

    /// Check if ``validator`` has a 0x01 or 0x02 prefixed withdrawal credential.
    pub fn has_execution_withdrawal_credential(&self) -> bool {
        self.has_compounding_withdrawal_credential() || self.has_eth1_withdrawal_credential()
    }

    /// The execution address encoded in the last 20 bytes of the withdrawal credentials.
    pub fn withdrawal_address(&self) -> Option<Address> {
        self.has_execution_withdrawal_credential()
            .then(|| Address::from_slice(&self.withdrawal_credentials[12..]))
    }

    pub fn is_active_validator(&self, epoch: u64) -> bool {
        self.activation_epoch <= epoch && epoch < self.exit_epoch
    }

    /// Check if ``validator`` is fully withdrawable.
    pub fn is_fully_withdrawable_validator(&self, balance: u64, epoch: u64) -> bool {
        self.has_execution_withdrawal_credential()
            && self.withdrawable_epoch <= epoch
            && balance > 0
    }

    /// Check if ``validator`` is partially withdrawable. The chain caps every validator at the
    /// same maximum, whatever its credential prefix.
    pub fn is_partially_withdrawable_validator(
        &self,
        balance: u64,
        max_effective_balance: u64,
    ) -> bool {
        self.has_execution_withdrawal_credential()
            && self.effective_balance == max_effective_balance
            && balance > max_effective_balance
    }

    /// Check if ``validator`` is eligible to be placed into the activation queue.
    pub fn is_eligible_for_activation_queue(&self, min_activation_balance: u64) -> bool {
        self.activation_eligibility_epoch == FAR_FUTURE_EPOCH
            && self.effective_balance >= min_activation_balance
    }

    /// Check if ``validator`` is eligible for activation as of ``epoch``.
    pub fn is_eligible_for_activation(&self, epoch: u64) -> bool {
        self.activation_eligibility_epoch <= epoch && self.activation_epoch == FAR_FUTURE_EPOCH
    }
}

pub fn compute_effective_balance(
    balance: u64,
    effective_balance_increment: u64,
    max_effective_balance: u64,
) -> u64 {
    (balance - balance % effective_balance_increment).min(max_effective_balance)
}
