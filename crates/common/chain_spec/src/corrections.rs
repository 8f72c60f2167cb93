use alloy_primitives::{B256, aliases::B32};
use serde::{Deserialize, Serialize};
use stf_bls::PubKey;

/// When a correction fires.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionTrigger {
    /// The first block whose timestamp falls under this fork version.
    AtForkVersion(#[serde(with = "crate::b32_hex")] B32),
    /// When the state reaches this slot.
    AtSlot(u64),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionAction {
    /// Schedule the validator for exit at the next epoch. No-op if the validator is unknown or
    /// already exiting.
    ForceExit { pubkey: PubKey },
    /// Add a validator that never made it through the deposit flow. No-op if the pubkey is
    /// already registered.
    ForceCreate {
        pubkey: PubKey,
        withdrawal_credentials: B256,
        balance: u64,
    },
}

/// One-off state remediation for a single network. Corrections are part of that network's
/// state history and must be replayed by every node syncing it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCorrection {
    pub deposit_eth1_chain_id: u64,
    pub trigger: CorrectionTrigger,
    pub action: CorrectionAction,
}

impl StateCorrection {
    /// Whether this correction should run for a chain on ``deposit_eth1_chain_id`` that is
    /// processing ``slot``. ``active_version`` is the fork version scheduled at the block's
    /// timestamp and ``parent_version`` the one scheduled at its parent's, or `None` for the first
    /// block after genesis.
    pub fn is_triggered(
        &self,
        deposit_eth1_chain_id: u64,
        slot: u64,
        parent_version: Option<B32>,
        active_version: B32,
    ) -> bool {
        if self.deposit_eth1_chain_id != deposit_eth1_chain_id {
            return false;
        }
        match &self.trigger {
            CorrectionTrigger::AtForkVersion(version) => {
                *version == active_version && parent_version != Some(active_version)
            }
            CorrectionTrigger::AtSlot(trigger_slot) => *trigger_slot == slot,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::fixed_bytes;

    use super::*;

    fn correction(trigger: CorrectionTrigger) -> StateCorrection {
        StateCorrection {
            deposit_eth1_chain_id: 80094,
            trigger,
            action: CorrectionAction::ForceExit {
                pubkey: PubKey::default(),
            },
        }
    }

    #[test]
    fn test_slot_trigger() {
        let correction = correction(CorrectionTrigger::AtSlot(7));
        let version = fixed_bytes!("0x04000000");
        assert!(correction.is_triggered(80094, 7, Some(version), version));
        assert!(!correction.is_triggered(80094, 8, Some(version), version));
        assert!(!correction.is_triggered(80069, 7, Some(version), version));
    }

    #[test]
    fn test_fork_trigger_fires_on_transition_only() {
        let electra = fixed_bytes!("0x05000000");
        let deneb1 = fixed_bytes!("0x04010000");
        let correction = correction(CorrectionTrigger::AtForkVersion(electra));

        assert!(correction.is_triggered(80094, 100, Some(deneb1), electra));
        assert!(!correction.is_triggered(80094, 101, Some(electra), electra));
        assert!(!correction.is_triggered(80094, 100, Some(deneb1), deneb1));
    }

    #[test]
    fn test_genesis_fork_trigger_fires_on_first_block() {
        let deneb = fixed_bytes!("0x04000000");
        let correction = correction(CorrectionTrigger::AtForkVersion(deneb));

        assert!(correction.is_triggered(80094, 1, None, deneb));
        assert!(!correction.is_triggered(80094, 2, Some(deneb), deneb));
    }
}
